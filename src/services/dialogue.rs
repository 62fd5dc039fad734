//! The step state machine. Each webhook carries the whole call state in its
//! URL (`step`, `lang`); handlers here are plain functions from that state
//! plus the platform's form fields to the next voice-markup document.

use crate::models::{CallStep, CaptureStrategy, Language, Phrase};
use crate::services::ai::extract::extract_appointment;
use crate::services::calendar::build_event;
use crate::services::twiml::{Gather, Twiml};
use crate::state::AppState;

/// Seconds of audio the record-then-transcribe strategy captures.
const MAX_RECORDING_SECS: u32 = 30;

/// Form fields the platform posts with each callback. All optional; which
/// ones arrive depends on the step and capture strategy.
#[derive(Debug, Default)]
pub struct StepInput {
    pub digits: Option<String>,
    pub speech: Option<String>,
    pub caller: Option<String>,
    pub recording_url: Option<String>,
}

pub async fn handle_step(
    state: &AppState,
    step: CallStep,
    language: Option<Language>,
    input: &StepInput,
) -> anyhow::Result<String> {
    match step {
        CallStep::Start => Ok(start_menu(state)),
        CallStep::LanguageSelect => Ok(language_select(state, input)),
        CallStep::Collect => collect(state, language.unwrap_or(Language::PRIMARY), input).await,
    }
}

/// Language menu: one line per language, then gather a digit or a spoken
/// language name. Silence replays the menu.
fn start_menu(state: &AppState) -> String {
    let mut menu = Twiml::new();
    for language in Language::ALL {
        menu = render(menu, state, language, language.menu_phrase(&state.config.clinic_name));
    }

    Twiml::new()
        .gather(
            Gather {
                input: "dtmf speech",
                action: "/webhook/voice?step=lang",
                language: Language::PRIMARY.locale(),
                num_digits: Some(1),
                hints: Some("english, french, arabic"),
            },
            menu,
        )
        .redirect("/webhook/voice?step=start")
        .build()
}

/// Resolves the caller's choice and asks for name and time in that language,
/// with the capture strategy the language needs.
fn language_select(state: &AppState, input: &StepInput) -> String {
    let language = Language::resolve(input.digits.as_deref(), input.speech.as_deref());
    tracing::info!(
        language = language.code(),
        digits = input.digits.as_deref().unwrap_or(""),
        speech = input.speech.as_deref().unwrap_or(""),
        "language selected"
    );

    let action = format!("/webhook/voice?step=collect&lang={}", language.code());
    let prompt = render(Twiml::new(), state, language, language.details_prompt());

    match language.capture_strategy() {
        CaptureStrategy::NativeSpeech => {
            let doc = Twiml::new().gather(
                Gather {
                    input: "speech",
                    action: &action,
                    language: language.locale(),
                    num_digits: None,
                    hints: None,
                },
                prompt,
            );
            // Falling past the gather means the caller said nothing.
            render(doc, state, language, language.not_understood())
                .hangup()
                .build()
        }
        CaptureStrategy::RecordThenTranscribe => {
            prompt.record(&action, MAX_RECORDING_SECS).build()
        }
    }
}

/// Terminal step: acquire the utterance, extract the appointment, commit it,
/// and confirm or apologize. The call ends here either way.
async fn collect(
    state: &AppState,
    language: Language,
    input: &StepInput,
) -> anyhow::Result<String> {
    let utterance = acquire_utterance(state, language, input).await;
    if utterance.trim().is_empty() {
        tracing::info!(language = language.code(), "no utterance acquired");
        return Ok(farewell(state, language, language.not_understood()));
    }

    let now = state.config.local_now();
    let intent = extract_appointment(state.llm.as_ref(), &utterance, language, now).await;
    tracing::info!(
        patient = %intent.patient_name,
        start = %intent.start_time,
        "appointment extracted"
    );

    let caller = input.caller.as_deref().unwrap_or("unknown");
    let event = build_event(
        &intent,
        caller,
        &state.config.clinic_name,
        state.config.appointment_minutes,
        &state.config.clinic_timezone,
    );

    match state.calendar.insert_event(&event).await {
        Ok(()) => Ok(farewell(
            state,
            language,
            language.confirmation(&intent.patient_name, intent.start_time),
        )),
        Err(e) => {
            tracing::error!(error = %e, "calendar insert failed");
            Ok(farewell(state, language, language.booking_failed()))
        }
    }
}

async fn acquire_utterance(state: &AppState, language: Language, input: &StepInput) -> String {
    match language.capture_strategy() {
        CaptureStrategy::NativeSpeech => input.speech.clone().unwrap_or_default(),
        CaptureStrategy::RecordThenTranscribe => {
            let Some(url) = input.recording_url.as_deref() else {
                return String::new();
            };
            if state.transcriber.is_empty() {
                tracing::warn!("no transcription providers configured");
                return String::new();
            }
            match state.recordings.fetch(url).await {
                Ok(audio) => state.transcriber.transcribe(&audio, language.code()).await,
                Err(e) => {
                    tracing::warn!(error = %e, "recording unavailable");
                    String::new()
                }
            }
        }
    }
}

/// Always well-formed markup, used by the webhook handler when a step blows
/// up in a way the step logic did not absorb.
pub fn fatal_apology(state: &AppState, language: Option<Language>) -> String {
    let language = language.unwrap_or(Language::PRIMARY);
    farewell(state, language, language.generic_error())
}

fn farewell(state: &AppState, language: Language, phrase: Phrase) -> String {
    render(Twiml::new(), state, language, phrase).hangup().build()
}

fn render(twiml: Twiml, state: &AppState, language: Language, phrase: Phrase) -> Twiml {
    match phrase {
        Phrase::Say(text) => twiml.say(language.locale(), &text),
        Phrase::Play(asset) => twiml.play(&state.config.audio_url(asset)),
    }
}
