//! Drip email template set.
//!
//! [`DripEmail`] has one variant per
//! [`DripStage`](fundpath_core::drip::DripStage), each carrying exactly the
//! inputs that stage needs. Rendering is pure: no I/O, no clock, and the
//! same input always yields the same [`RenderedEmail`]. Links are supplied
//! by the caller (see [`Links`]) rather than computed here.

mod layout;

pub use layout::escape_html;

use fundpath_core::drip::{CheckInVariant, NextAction};

use layout::{document, Block, Cta};

/// Greeting used when the user has no name on file.
pub const FALLBACK_NAME: &str = "there";

/// Business description used when the profile has no business type yet.
pub const FALLBACK_BUSINESS_TYPE: &str = "your business";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Builds the absolute URLs embedded in drip emails from the app base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    base_url: String,
}

impl Links {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn at(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn dashboard(&self) -> String {
        self.at("/dashboard")
    }

    pub fn upload(&self) -> String {
        self.at("/dashboard/documents")
    }

    pub fn action(&self, action: NextAction) -> String {
        match action {
            NextAction::ConnectBank => self.at("/dashboard/banking"),
            NextAction::AddTradelines => self.at("/dashboard/tradelines"),
            NextAction::SetGoals => self.at("/dashboard/goals"),
        }
    }

    pub fn roadmap(&self) -> String {
        self.at("/dashboard/roadmap")
    }

    pub fn consult(&self) -> String {
        self.at("/consultation")
    }

    pub fn webinar(&self) -> String {
        self.at("/webinar")
    }

    pub fn upgrade(&self) -> String {
        self.at("/pricing")
    }

    pub fn support(&self) -> String {
        self.at("/support")
    }

    pub fn book_demo(&self) -> String {
        self.at("/book-demo")
    }
}

// ---------------------------------------------------------------------------
// Per-stage inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub name: String,
    pub dashboard_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUploadEmail {
    pub name: String,
    pub business_type: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextActionEmail {
    pub name: String,
    pub business_type: String,
    pub action_url: String,
    pub action_needed: NextAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapEmail {
    pub name: String,
    pub business_type: String,
    pub roadmap_url: String,
    pub consult_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementEmail {
    pub name: String,
    pub webinar_url: String,
    pub upgrade_url: String,
    pub is_high_engagement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInEmail {
    pub name: String,
    pub support_url: String,
    pub book_demo_url: String,
    pub completion_percentage: i32,
    pub variant: CheckInVariant,
}

// ---------------------------------------------------------------------------
// DripEmail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DripEmail {
    Welcome(WelcomeEmail),
    Day1(DocumentUploadEmail),
    Day2(NextActionEmail),
    Day4(RoadmapEmail),
    Day7(EngagementEmail),
    Day10(CheckInEmail),
}

impl DripEmail {
    pub fn render(&self) -> RenderedEmail {
        match self {
            Self::Welcome(e) => render_welcome(e),
            Self::Day1(e) => render_document_upload(e),
            Self::Day2(e) => render_next_action(e),
            Self::Day4(e) => render_roadmap(e),
            Self::Day7(e) => render_engagement(e),
            Self::Day10(e) => render_check_in(e),
        }
    }
}

fn finish(subject: String, heading: &str, blocks: &[Block<'_>]) -> RenderedEmail {
    let html = document(&subject, heading, blocks);
    RenderedEmail { subject, html }
}

fn greeting(name: &str) -> Block<'static> {
    Block::Paragraph(format!("Hi {name},"))
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

fn render_welcome(e: &WelcomeEmail) -> RenderedEmail {
    finish(
        "Welcome to Fundpath, let's build your business credit".to_string(),
        "Welcome aboard!",
        &[
            greeting(&e.name),
            Block::Paragraph(
                "Thanks for joining Fundpath. Over the next few days we'll walk you \
                 through everything you need to qualify for business funding."
                    .into(),
            ),
            Block::Bullets(vec![
                "Complete your business profile".into(),
                "Upload your EIN documentation".into(),
                "Connect your business bank account".into(),
            ]),
            Block::Button(Cta {
                label: "Go to My Dashboard",
                url: &e.dashboard_url,
            }),
        ],
    )
}

fn render_document_upload(e: &DocumentUploadEmail) -> RenderedEmail {
    finish(
        format!("{}: one document away from your credit profile", e.business_type),
        "Upload your EIN documentation",
        &[
            greeting(&e.name),
            Block::Html(format!(
                "Lenders want to see that <strong>{}</strong> is a real, registered entity. \
                 Uploading your EIN confirmation letter is the fastest way to show it.",
                escape_html(&e.business_type)
            )),
            Block::Paragraph("It takes about two minutes and unlocks your credit roadmap.".into()),
            Block::Button(Cta {
                label: "Upload Documents",
                url: &e.upload_url,
            }),
        ],
    )
}

fn render_next_action(e: &NextActionEmail) -> RenderedEmail {
    let (heading, pitch, label) = match e.action_needed {
        NextAction::ConnectBank => (
            "Connect your business bank account",
            "A connected bank account lets us verify revenue and match you with \
             lenders that fit your cash flow.",
            "Connect My Bank",
        ),
        NextAction::AddTradelines => (
            "Add your trade lines",
            "Trade lines are the vendor accounts that report to business credit \
             bureaus. Listing them shows us where your credit stands today.",
            "Add Trade Lines",
        ),
        NextAction::SetGoals => (
            "Set your funding goals",
            "Tell us how much funding you want and what it's for, and we'll build a \
             plan to get you there.",
            "Set My Goals",
        ),
    };

    finish(
        format!("Your next step for {}", e.business_type),
        heading,
        &[
            greeting(&e.name),
            Block::Html(format!(
                "Here's the one thing that will move <strong>{}</strong> forward the most right now.",
                escape_html(&e.business_type)
            )),
            Block::Paragraph(pitch.into()),
            Block::Button(Cta {
                label,
                url: &e.action_url,
            }),
        ],
    )
}

fn render_roadmap(e: &RoadmapEmail) -> RenderedEmail {
    finish(
        format!("Your credit-building roadmap for {} is ready", e.business_type),
        "Your roadmap is ready",
        &[
            greeting(&e.name),
            Block::Html(format!(
                "We've mapped out the steps to build credit for <strong>{}</strong>, from \
                 starter vendor accounts to revolving lines.",
                escape_html(&e.business_type)
            )),
            Block::Button(Cta {
                label: "View My Roadmap",
                url: &e.roadmap_url,
            }),
            Block::Paragraph(
                "Prefer to talk it through? Book a free consultation with a funding advisor."
                    .into(),
            ),
            Block::Button(Cta {
                label: "Book a Free Consultation",
                url: &e.consult_url,
            }),
        ],
    )
}

fn render_engagement(e: &EngagementEmail) -> RenderedEmail {
    if e.is_high_engagement {
        finish(
            "You're ahead of the curve. Ready for the fast track?".to_string(),
            "Unlock the fast track",
            &[
                greeting(&e.name),
                Block::Paragraph(
                    "You've made great progress on your profile this week. Premium members \
                     get a dedicated advisor, lender matching and monthly credit monitoring."
                        .into(),
                ),
                Block::Button(Cta {
                    label: "Upgrade to Premium",
                    url: &e.upgrade_url,
                }),
            ],
        )
    } else {
        finish(
            "Free webinar: funding secrets lenders won't tell you".to_string(),
            "Join our free funding webinar",
            &[
                greeting(&e.name),
                Block::Paragraph(
                    "Getting started can feel overwhelming. In our live webinar we cover the \
                     exact steps businesses use to qualify for their first credit lines."
                        .into(),
                ),
                Block::Button(Cta {
                    label: "Save My Spot",
                    url: &e.webinar_url,
                }),
            ],
        )
    }
}

fn render_check_in(e: &CheckInEmail) -> RenderedEmail {
    let progress = Block::Paragraph(format!(
        "Your profile is {}% complete.",
        e.completion_percentage.clamp(0, 100)
    ));

    match e.variant {
        CheckInVariant::SupportOffer => finish(
            "Need a hand finishing your profile?".to_string(),
            "We're here to help",
            &[
                greeting(&e.name),
                progress,
                Block::Paragraph(
                    "If something is holding you up, our support team can walk you through \
                     the remaining steps one on one."
                        .into(),
                ),
                Block::Button(Cta {
                    label: "Get Support",
                    url: &e.support_url,
                }),
            ],
        ),
        CheckInVariant::StrategySession => finish(
            "Let's plan your funding strategy".to_string(),
            "You're ready for a strategy session",
            &[
                greeting(&e.name),
                progress,
                Block::Paragraph(
                    "You've laid the groundwork. A 30-minute session with an advisor will turn \
                     your profile into a concrete funding plan."
                        .into(),
                ),
                Block::Button(Cta {
                    label: "Book Your Strategy Session",
                    url: &e.book_demo_url,
                }),
            ],
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Links {
        Links::new("https://app.fundpath.io/")
    }

    fn engagement(high: bool) -> DripEmail {
        DripEmail::Day7(EngagementEmail {
            name: "Dana".into(),
            webinar_url: links().webinar(),
            upgrade_url: links().upgrade(),
            is_high_engagement: high,
        })
    }

    #[test]
    fn links_strip_trailing_slash() {
        assert_eq!(links().dashboard(), "https://app.fundpath.io/dashboard");
        assert_eq!(
            links().action(NextAction::ConnectBank),
            "https://app.fundpath.io/dashboard/banking"
        );
    }

    #[test]
    fn welcome_includes_name_and_dashboard_link() {
        let out = DripEmail::Welcome(WelcomeEmail {
            name: "Dana".into(),
            dashboard_url: links().dashboard(),
        })
        .render();
        assert!(out.html.contains("Hi Dana,"));
        assert!(out.html.contains("href=\"https://app.fundpath.io/dashboard\""));
        assert!(out.subject.contains("Welcome"));
    }

    #[test]
    fn personalization_is_escaped() {
        let out = DripEmail::Day1(DocumentUploadEmail {
            name: "<script>alert(1)</script>".into(),
            business_type: "Smith & Sons".into(),
            upload_url: links().upload(),
        })
        .render();
        assert!(!out.html.contains("<script>"));
        assert!(out.html.contains("&lt;script&gt;"));
        assert!(out.html.contains("Smith &amp; Sons"));
        // Subject is plain text, not HTML.
        assert_eq!(out.subject, "Smith & Sons: one document away from your credit profile");
    }

    #[test]
    fn day2_copy_follows_action() {
        let render = |action| {
            DripEmail::Day2(NextActionEmail {
                name: "Dana".into(),
                business_type: "LLC".into(),
                action_url: links().action(action),
                action_needed: action,
            })
            .render()
            .html
        };
        assert!(render(NextAction::ConnectBank).contains("Connect My Bank"));
        assert!(render(NextAction::AddTradelines).contains("Add Trade Lines"));
        assert!(render(NextAction::SetGoals).contains("Set My Goals"));
    }

    #[test]
    fn day7_high_engagement_upsells() {
        let html = engagement(true).render().html;
        assert!(html.contains("Upgrade to Premium"));
        assert!(!html.contains("Save My Spot"));
    }

    #[test]
    fn day7_low_engagement_invites_to_webinar() {
        let html = engagement(false).render().html;
        assert!(html.contains("Save My Spot"));
        assert!(!html.contains("Upgrade to Premium"));
    }

    #[test]
    fn day10_variants() {
        let render = |variant, pct| {
            DripEmail::Day10(CheckInEmail {
                name: "Dana".into(),
                support_url: links().support(),
                book_demo_url: links().book_demo(),
                completion_percentage: pct,
                variant,
            })
            .render()
            .html
        };
        let support = render(CheckInVariant::SupportOffer, 25);
        assert!(support.contains("Get Support"));
        assert!(support.contains("25% complete"));

        let strategy = render(CheckInVariant::StrategySession, 88);
        assert!(strategy.contains("Book Your Strategy Session"));
        assert!(strategy.contains("88% complete"));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(engagement(true).render(), engagement(true).render());
    }
}
