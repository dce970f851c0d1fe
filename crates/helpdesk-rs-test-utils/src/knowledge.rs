use helpdesk_rs_knowledge::{FaqEntry, InMemoryKnowledgeBase, IntentEntry, KnowledgeArticle};

/// Small support knowledge base used across test suites.
pub fn sample_knowledge() -> InMemoryKnowledgeBase {
    InMemoryKnowledgeBase::new()
        .with_faqs([
            FaqEntry::new("password reset", "Click forgot password"),
            FaqEntry::new(
                "How do I install the printer driver",
                "Download the driver from the support portal and run the installer.",
            ),
        ])
        .with_intents([
            IntentEntry::new(
                "greeting",
                ["hello there", "good morning"],
                ["Hello! How can I help you today?"],
            ),
            IntentEntry::new(
                "thanks",
                ["thank you very much", "thanks a lot"],
                ["You're welcome!", "Happy to help!"],
            ),
        ])
        .with_articles([KnowledgeArticle::new(
            "VPN setup",
            "Install the VPN client, then sign in with your company account.",
        )])
}
