//! Gate layers: independent checks whose results only ever deduct from the
//! aggregated score, never from individual layers.

pub mod gibberish;
pub mod off_topic;

pub use gibberish::{GibberishDetector, GibberishReport};
pub use off_topic::{OffTopicDetector, OffTopicReport};

use serde::Serialize;

use crate::context::ScoringContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GateReport {
    pub gibberish: GibberishReport,
    pub off_topic: OffTopicReport,
}

impl GateReport {
    /// Run both gates over a prepared context.
    pub fn evaluate(ctx: &ScoringContext<'_>) -> Self {
        let gibberish = GibberishDetector::new(ctx.lexicon, &ctx.config.gibberish).detect(&ctx.student);
        let off_topic = OffTopicDetector::new(&ctx.config.off_topic).detect(ctx);
        Self {
            gibberish,
            off_topic,
        }
    }
}
