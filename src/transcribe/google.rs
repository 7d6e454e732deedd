//! Google Cloud Speech-to-Text over the synchronous `speech:recognize` surface.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hound::{SampleFormat, WavReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

use super::backend::{LanguageTag, RecognitionBackend, RecognitionError};

const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Recognizer backed by Google Cloud Speech-to-Text
pub struct GoogleSpeechBackend {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleSpeechBackend {
    pub fn new(api_key: String, endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

/// Split a WAV payload into raw little-endian PCM plus its sample rate.
///
/// The request body wants LINEAR16 content without the RIFF header.
fn wav_to_linear16(audio: &[u8]) -> Result<(Vec<u8>, u32), RecognitionError> {
    let mut reader = WavReader::new(Cursor::new(audio))
        .map_err(|e| RecognitionError::Backend(format!("invalid wav payload: {e}")))?;
    let spec = reader.spec();

    if spec.channels != 1
        || spec.bits_per_sample != 16
        || !matches!(spec.sample_format, SampleFormat::Int)
    {
        return Err(RecognitionError::Backend(
            "expected a mono 16-bit PCM payload".to_string(),
        ));
    }

    let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        let sample = sample.map_err(|e| RecognitionError::Backend(format!("wav read: {e}")))?;
        pcm.extend_from_slice(&sample.to_le_bytes());
    }

    Ok((pcm, spec.sample_rate))
}

/// Assemble the transcript out of a recognition response.
///
/// An empty result list is how the service reports audio it processed but
/// could not understand.
fn transcript_from(response: RecognizeResponse) -> Result<String, RecognitionError> {
    let text = response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.trim())
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return Err(RecognitionError::Unintelligible);
    }

    Ok(text)
}

#[async_trait]
impl RecognitionBackend for GoogleSpeechBackend {
    async fn recognize(
        &self,
        audio: &[u8],
        language: &LanguageTag,
    ) -> Result<String, RecognitionError> {
        let (pcm, sample_rate) = wav_to_linear16(audio)?;

        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: sample_rate,
                language_code: language.as_str(),
            },
            audio: RecognitionAudio {
                content: BASE64.encode(&pcm),
            },
        };

        debug!(
            bytes = pcm.len(),
            sample_rate,
            language = %language,
            "Submitting audio for recognition"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| RecognitionError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(RecognitionError::Backend(format!(
                "speech API returned {status}: {snippet}"
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Backend(format!("malformed response: {e}")))?;

        transcript_from(parsed)
    }

    fn name(&self) -> &'static str {
        "google-speech"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_wav;

    #[test]
    fn wav_payload_is_stripped_to_raw_pcm() {
        let samples = [1i16, -2, 32767];
        let payload = encode_wav(&samples, 16_000).unwrap();

        let (pcm, sample_rate) = wav_to_linear16(&payload).unwrap();
        assert_eq!(sample_rate, 16_000);
        assert_eq!(pcm, vec![0x01, 0x00, 0xFE, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn garbage_payload_is_a_backend_error() {
        let err = wav_to_linear16(b"definitely not audio").unwrap_err();
        assert!(matches!(err, RecognitionError::Backend(_)));
    }

    #[test]
    fn transcript_joins_result_fragments() {
        let body = r#"{
            "results": [
                {"alternatives": [{"transcript": "ಕನ್ನಡ ಭಾಷೆ", "confidence": 0.91}]},
                {"alternatives": [{"transcript": " ತುಂಬಾ ಚೆನ್ನಾಗಿದೆ "}]}
            ]
        }"#;
        let response: RecognizeResponse = serde_json::from_str(body).unwrap();

        let text = transcript_from(response).unwrap();
        assert_eq!(text, "ಕನ್ನಡ ಭಾಷೆ ತುಂಬಾ ಚೆನ್ನಾಗಿದೆ");
    }

    #[test]
    fn empty_results_mean_unintelligible() {
        let response: RecognizeResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            transcript_from(response),
            Err(RecognitionError::Unintelligible)
        ));

        let blank: RecognizeResponse =
            serde_json::from_str(r#"{"results": [{"alternatives": [{"transcript": "  "}]}]}"#)
                .unwrap();
        assert!(matches!(
            transcript_from(blank),
            Err(RecognitionError::Unintelligible)
        ));
    }
}
