use std::path::Path;
use std::time::Duration;

use log::{debug, error, info};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use super::client::{JobId, JobOptions, ProviderStatus, TranscriptFormat, TranscriptionProvider};
use super::config::ApiConfig;
use super::error::SessionError;

/// Limit on establishing a connection. Requests themselves have no deadline,
/// so an upload may take as long as the file needs.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Speechmatics Batch (v2) API client
#[derive(Debug)]
pub struct SpeechmaticsClient {
    api: ApiConfig,
    http: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobDetailsResponse {
    job: JobDetails,
}

#[derive(Debug, Deserialize)]
struct JobDetails {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    job_status: Option<JobStatusBody>,
}

#[derive(Debug, Deserialize)]
struct JobStatusBody {
    current_phase: String,
    #[serde(default)]
    progress: f64,
}

impl SpeechmaticsClient {
    /// Build the client and its HTTP connection pool.
    ///
    /// The blocking client owns a runtime of its own, so this must not be
    /// called (or the client dropped) from inside an async task.
    pub fn new(api: ApiConfig) -> reqwest::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self { api, http })
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.api.api_url)
    }

    fn job_url(&self, job: &JobId) -> String {
        format!("{}/jobs/{}", self.api.api_url, job)
    }

    fn add_auth(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        request.bearer_auth(self.api.api_token.expose_secret())
    }

    /// Build multipart form: media file plus the JSON job config
    fn build_form(
        &self,
        media: &Path,
        options: &JobOptions,
    ) -> Result<reqwest::blocking::multipart::Form, SessionError> {
        let config = json!({
            "type": "transcription",
            "transcription_config": {
                "language": options.language,
                "operating_point": options.operating_point.to_string(),
            }
        });

        let form = reqwest::blocking::multipart::Form::new()
            .file("data_file", media)
            .map_err(|e| SessionError::Submission(format!("Failed to read {:?}: {}", media, e)))?
            .text("config", config.to_string());

        Ok(form)
    }

    /// Send `request`, turning non-success statuses into `map_err(message)`
    fn send(
        request: reqwest::blocking::RequestBuilder,
        map_err: fn(String) -> SessionError,
    ) -> Result<reqwest::blocking::Response, SessionError> {
        let response = request.send().map_err(|e| {
            error!("API request error: {}", e);
            map_err(format!("Request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("API error response ({}): {}", status, error_text);
            return Err(map_err(format!(
                "API returned status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl TranscriptionProvider for SpeechmaticsClient {
    fn submit_job(&self, media: &Path, options: &JobOptions) -> Result<JobId, SessionError> {
        let form = self.build_form(media, options)?;

        let request = self.add_auth(self.http.post(self.jobs_url())).multipart(form);
        let response = Self::send(request, SessionError::Submission)?;

        let body: CreateJobResponse = response.json().map_err(|e| {
            error!("Failed to parse job creation response: {}", e);
            SessionError::Submission(format!("Failed to parse response: {}", e))
        })?;

        info!(
            "Created job {} ({}, {})",
            body.id, options.language, options.operating_point
        );
        Ok(JobId::new(body.id))
    }

    fn job_status(&self, job: &JobId) -> Result<ProviderStatus, SessionError> {
        let request = self.add_auth(self.http.get(self.job_url(job)));
        let response = Self::send(request, SessionError::Transport)?;

        let details: JobDetailsResponse = response.json().map_err(|e| {
            error!("Failed to parse job details: {}", e);
            SessionError::Transport(format!("Failed to parse response: {}", e))
        })?;

        let status = match details.job {
            JobDetails {
                job_status: Some(body),
                ..
            } => ProviderStatus {
                phase: body.current_phase,
                progress: body.progress,
            },
            JobDetails {
                status: Some(status),
                ..
            } => ProviderStatus {
                phase: status,
                progress: 0.0,
            },
            _ => {
                return Err(SessionError::Transport(format!(
                    "Job {} details carry no status",
                    job
                )))
            }
        };

        debug!("Job {} is {} ({:.2})", job, status.phase, status.progress);
        Ok(status)
    }

    fn transcript(&self, job: &JobId, format: TranscriptFormat) -> Result<String, SessionError> {
        let request = self
            .add_auth(self.http.get(format!("{}/transcript", self.job_url(job))))
            .query(&[("format", format.to_string())]);
        let response = Self::send(request, SessionError::Fetch)?;

        let text = response.text().map_err(|e| {
            error!("Failed to read transcript body: {}", e);
            SessionError::Fetch(format!("Failed to read response: {}", e))
        })?;

        info!("Fetched {} transcript for job {}: {} characters", format, job, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatingPoint;
    use mockito::Matcher;
    use secrecy::SecretString;

    fn client(server: &mockito::Server) -> SpeechmaticsClient {
        SpeechmaticsClient::new(ApiConfig::new(
            SecretString::from("test-token".to_string()),
            server.url(),
        ))
        .unwrap()
    }

    fn options() -> JobOptions {
        JobOptions {
            language: "fa".to_string(),
            operating_point: OperatingPoint::Enhanced,
        }
    }

    #[test]
    fn test_submit_job_uploads_media_and_config() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/jobs")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="data_file""#.to_string()),
                Matcher::Regex(r#""operating_point":"enhanced""#.to_string()),
                Matcher::Regex(r#""language":"fa""#.to_string()),
            ]))
            .with_status(201)
            .with_body(r#"{"id": "dxab12"}"#)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("talk.mp3");
        std::fs::write(&media, b"ID3").unwrap();

        let job = client(&server).submit_job(&media, &options()).unwrap();

        assert_eq!(job.as_str(), "dxab12");
        mock.assert();
    }

    #[test]
    fn test_submit_waits_for_a_slow_server() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/jobs")
            .with_status(201)
            .with_body_from_request(|_| {
                // Longer than reqwest's default whole-request timeout.
                std::thread::sleep(Duration::from_secs(35));
                br#"{"id": "slow01"}"#.to_vec()
            })
            .create();

        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("long.wav");
        std::fs::write(&media, vec![0_u8; 1 << 20]).unwrap();

        let job = client(&server).submit_job(&media, &options()).unwrap();

        assert_eq!(job.as_str(), "slow01");
        mock.assert();
    }

    #[test]
    fn test_submit_rejection_is_submission_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/jobs")
            .with_status(401)
            .with_body(r#"{"code": 401, "error": "Permission Denied"}"#)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("talk.wav");
        std::fs::write(&media, b"RIFF").unwrap();

        let err = client(&server).submit_job(&media, &options()).unwrap_err();

        assert!(matches!(err, SessionError::Submission(_)));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_submit_missing_media_fails_before_request() {
        let server = mockito::Server::new();
        let err = client(&server)
            .submit_job(Path::new("/definitely/not/here.mp3"), &options())
            .unwrap_err();

        assert!(matches!(err, SessionError::Submission(_)));
    }

    #[test]
    fn test_job_status_reads_phase_and_progress() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/jobs/dxab12")
            .with_status(200)
            .with_body(r#"{"job": {"id": "dxab12", "job_status": {"current_phase": "running", "progress": 0.37}}}"#)
            .create();

        let status = client(&server).job_status(&JobId::new("dxab12")).unwrap();

        assert_eq!(status.phase, "running");
        assert!((status.progress - 0.37).abs() < f64::EPSILON);
    }

    #[test]
    fn test_job_status_falls_back_to_plain_status() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/jobs/dxab12")
            .with_status(200)
            .with_body(r#"{"job": {"id": "dxab12", "status": "done"}}"#)
            .create();

        let status = client(&server).job_status(&JobId::new("dxab12")).unwrap();

        assert_eq!(status.phase, "done");
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn test_job_status_errors_are_transport_errors() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/jobs/dxab12").with_status(503).create();
        server
            .mock("GET", "/jobs/empty")
            .with_status(200)
            .with_body(r#"{"job": {"id": "empty"}}"#)
            .create();
        let client = client(&server);

        assert!(matches!(
            client.job_status(&JobId::new("dxab12")),
            Err(SessionError::Transport(_))
        ));
        assert!(matches!(
            client.job_status(&JobId::new("empty")),
            Err(SessionError::Transport(_))
        ));
    }

    #[test]
    fn test_transcript_requests_format() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/jobs/dxab12/transcript")
            .match_query(Matcher::UrlEncoded("format".into(), "txt".into()))
            .with_status(200)
            .with_body("salam donya")
            .create();
        server
            .mock("GET", "/jobs/dxab12/transcript")
            .match_query(Matcher::UrlEncoded("format".into(), "srt".into()))
            .with_status(200)
            .with_body("1\n00:00:00,000 --> 00:00:01,200\nsalam donya\n")
            .create();
        let client = client(&server);
        let job = JobId::new("dxab12");

        assert_eq!(
            client.transcript(&job, TranscriptFormat::Text).unwrap(),
            "salam donya"
        );
        assert!(client
            .transcript(&job, TranscriptFormat::Srt)
            .unwrap()
            .starts_with("1\n00:00:00,000"));
    }

    #[test]
    fn test_transcript_failure_is_fetch_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/jobs/dxab12/transcript")
            .match_query(Matcher::Any)
            .with_status(404)
            .create();

        assert!(matches!(
            client(&server).transcript(&JobId::new("dxab12"), TranscriptFormat::Srt),
            Err(SessionError::Fetch(_))
        ));
    }
}
