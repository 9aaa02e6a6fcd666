use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use keyframe_table::Row;
use reqwest::blocking::Client;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "signphrase-cli",
    about = "Send a gesture stream or a sentence to signphrase-api and print the result"
)]
struct ClientCli {
    /// Raw fingerspelled gesture stream to classify (e.g. A-STOP-N-STOP-N-STOP)
    #[arg(long, conflicts_with = "sentence", required_unless_present = "sentence")]
    gesture: Option<String>,

    /// Sentence to match against the phrase catalog
    #[arg(long)]
    sentence: Option<String>,

    /// Base URL of the running API
    #[arg(
        long,
        env = "SIGNPHRASE_API_URL",
        default_value = "http://127.0.0.1:5000"
    )]
    api_url: String,

    /// Seconds before the request times out
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Print the raw JSON response instead of a summary
    #[arg(long, default_value_t = false)]
    raw: bool,
}

fn main() -> Result<()> {
    let cli = ClientCli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let client = Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs.max(1)))
        .build()
        .context("failed to build API HTTP client")?;
    let base = cli.api_url.trim_end_matches('/');

    if let Some(gesture) = &cli.gesture {
        let url = format!("{base}/classify");
        let body = fetch(&client, &url, ("gesture", gesture.as_str()))?;
        if cli.raw {
            println!("{body}");
            return Ok(());
        }
        let parsed: ClassifyResponse =
            serde_json::from_str(&body).context("failed to parse classify response")?;
        println!("{}", render_classification(&parsed));
    } else if let Some(sentence) = &cli.sentence {
        let url = format!("{base}/match_phrase");
        let body = fetch(&client, &url, ("sentence", sentence.as_str()))?;
        if cli.raw {
            println!("{body}");
            return Ok(());
        }
        let parsed: MatchResponse =
            serde_json::from_str(&body).context("failed to parse match response")?;
        println!("{}", render_match(&parsed));
    }
    Ok(())
}

fn fetch(client: &Client, url: &str, param: (&str, &str)) -> Result<String> {
    debug!(%url, "sending request");
    let resp = client
        .get(url)
        .query(&[param])
        .send()
        .with_context(|| format!("failed to call {url}"))?;
    let status = resp.status();
    let body = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    if !status.is_success() {
        bail!("API returned {}: {}", status, body);
    }
    Ok(body)
}

fn render_classification(resp: &ClassifyResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("Category:   {}\n", resp.category));
    out.push_str(&format!("Statement:  {}\n", resp.statement));
    out.push_str(&format!("Confidence: {:.3}\n", resp.confidence));
    if let Some(label) = &resp.matched_occupation {
        out.push_str(&format!("Occupation: {label}\n"));
    }
    match &resp.translation {
        Some(translation) => {
            out.push_str("--- Translation ---\n");
            out.push_str(translation.text.trim());
        }
        None => out.push_str("(translation disabled)"),
    }
    out
}

fn render_match(resp: &MatchResponse) -> String {
    let Some(phrase) = &resp.phrase else {
        return format!(
            "{} (best score {:.3})",
            resp.message.as_deref().unwrap_or("No matching phrase found"),
            resp.score
        );
    };
    let mut out = format!("Phrase: {phrase} (score {:.3})\n", resp.score);
    if let Some(Frames(frames)) = &resp.sequence {
        for (file, rows) in frames {
            match rows {
                Some(rows) => out.push_str(&format!("  {file}: {} keyframes\n", rows.len())),
                None => out.push_str(&format!("  {file}: missing\n")),
            }
        }
    }
    out.trim_end().to_string()
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: String,
    statement: String,
    confidence: f32,
    matched_occupation: Option<String>,
    translation: Option<TranslationBody>,
}

#[derive(Debug, Deserialize)]
struct TranslationBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    phrase: Option<String>,
    score: f32,
    sequence: Option<Frames>,
    #[serde(default)]
    message: Option<String>,
}

/// Asset entries in the order the API wrote them.
#[derive(Debug)]
struct Frames(Vec<(String, Option<Vec<Row>>)>);

impl<'de> Deserialize<'de> for Frames {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FramesVisitor;

        impl<'de> Visitor<'de> for FramesVisitor {
            type Value = Frames;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of asset filename to keyframe rows")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Frames, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut frames = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    frames.push(entry);
                }
                Ok(Frames(frames))
            }
        }

        deserializer.deserialize_map(FramesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_partial_sequence() {
        let resp: MatchResponse = serde_json::from_str(
            r#"{"phrase": "apa nama", "score": 0.95,
                "sequence": {"Apa.csv": [{"frame": "0"}], "Nama.csv": null}}"#,
        )
        .expect("parse");
        assert_eq!(
            render_match(&resp),
            "Phrase: apa nama (score 0.950)\n  Apa.csv: 1 keyframes\n  Nama.csv: missing"
        );
    }

    #[test]
    fn keeps_api_asset_order() {
        let resp: MatchResponse = serde_json::from_str(
            r#"{"phrase": "siapa nama", "score": 0.91,
                "sequence": {"Siapa.csv": null, "Nama.csv": [{"frame": "0"}, {"frame": "1"}]}}"#,
        )
        .expect("parse");
        assert_eq!(
            render_match(&resp),
            "Phrase: siapa nama (score 0.910)\n  Siapa.csv: missing\n  Nama.csv: 2 keyframes"
        );
    }

    #[test]
    fn renders_no_match() {
        let resp: MatchResponse = serde_json::from_str(
            r#"{"phrase": null, "score": 0.4, "sequence": null, "message": "No matching phrase found"}"#,
        )
        .expect("parse");
        assert_eq!(render_match(&resp), "No matching phrase found (best score 0.400)");
    }

    #[test]
    fn renders_classification_without_translation() {
        let resp: ClassifyResponse = serde_json::from_str(
            r#"{"category": "Height", "normalized_value": "120", "statement": "My height is 120 cm",
                "confidence": 1.0, "matched_occupation": null, "translation": null}"#,
        )
        .expect("parse");
        let text = render_classification(&resp);
        assert!(text.starts_with("Category:   Height\nStatement:  My height is 120 cm\n"));
        assert!(text.ends_with("(translation disabled)"));
    }
}
