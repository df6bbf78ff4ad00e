//! Advice generation: orchestration, prompts, and generated-content repair

pub mod learning_path;
pub mod orchestrator;
pub mod prompts;

pub use learning_path::{parse_generated_phases, GeneratedPhase};
pub use orchestrator::{
    AdviceParams, AdvicePayload, AdviceResponse, AdvisorStores, CareerAdvisor, CareerPick,
    GenerationStatus, LearningPathDraft, MissingInfo,
};
pub use prompts::{ActivePrompts, PromptConfig};
