//! Builder for the voice-markup documents the telephony platform executes.
//! Every webhook response is one of these, even on total failure.

use std::fmt::Write;

#[derive(Debug, Default)]
pub struct Twiml {
    verbs: String,
}

/// Attributes for a `<Gather>` verb. The platform collects DTMF and/or
/// speech, then posts the result to `action`.
pub struct Gather<'a> {
    pub input: &'a str,
    pub action: &'a str,
    pub language: &'a str,
    pub num_digits: Option<u32>,
    pub hints: Option<&'a str>,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, locale: &str, text: &str) -> Self {
        let _ = write!(
            self.verbs,
            r#"<Say language="{}">{}</Say>"#,
            escape(locale),
            escape(text)
        );
        self
    }

    pub fn play(mut self, url: &str) -> Self {
        let _ = write!(self.verbs, "<Play>{}</Play>", escape(url));
        self
    }

    pub fn gather(mut self, options: Gather<'_>, inner: Twiml) -> Self {
        let mut attrs = format!(
            r#" input="{}" action="{}" method="POST" language="{}" speechTimeout="auto""#,
            escape(options.input),
            escape(options.action),
            escape(options.language)
        );
        if let Some(n) = options.num_digits {
            let _ = write!(attrs, r#" numDigits="{n}""#);
        }
        if let Some(hints) = options.hints {
            let _ = write!(attrs, r#" hints="{}""#, escape(hints));
        }
        let _ = write!(self.verbs, "<Gather{attrs}>{}</Gather>", inner.verbs);
        self
    }

    pub fn record(mut self, action: &str, max_seconds: u32) -> Self {
        let _ = write!(
            self.verbs,
            r#"<Record action="{}" method="POST" maxLength="{max_seconds}" playBeep="true"/>"#,
            escape(action)
        );
        self
    }

    pub fn redirect(mut self, url: &str) -> Self {
        let _ = write!(
            self.verbs,
            r#"<Redirect method="POST">{}</Redirect>"#,
            escape(url)
        );
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push_str("<Hangup/>");
        self
    }

    pub fn build(self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
            self.verbs
        )
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
