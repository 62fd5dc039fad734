use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::calendar::CalendarProvider;
use crate::services::recording::RecordingFetcher;
use crate::services::transcribe::TranscriberChain;

pub struct AppState {
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub transcriber: TranscriberChain,
    pub recordings: Box<dyn RecordingFetcher>,
    pub calendar: Box<dyn CalendarProvider>,
}
