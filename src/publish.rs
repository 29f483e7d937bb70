//! Publishing to the review platform.
//!
//! Three sequential REST stages against the Code Insights API: delete the
//! stale report, create (PUT) the new one, then POST annotations in batches
//! of at most 100. Stages are best-effort: a failed stage is logged and the
//! remaining stages still run; the first failure is returned once every
//! stage has finished.

use crate::config::BitbucketEnv;
use crate::models::insights::{Annotation, Report};
use crate::utils::pluralize;
use std::fmt;
use thiserror::Error;

/// The platform caps one annotations POST at this many items.
pub const MAX_ANNOTATIONS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One of the three publish stages, for error attribution.
pub enum Step {
    DeleteReport,
    CreateReport,
    CreateAnnotations,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::DeleteReport => "report deletion",
            Step::CreateReport => "report creation",
            Step::CreateAnnotations => "annotation submission",
        })
    }
}

#[derive(Debug, Error)]
/// Failure of a single publish stage.
pub enum PublishError {
    /// The platform answered with a non-success status; `body` carries the
    /// response text for the console.
    #[error("{step} returned HTTP {status}: {body}")]
    Status { step: Step, status: u16, body: String },
    #[error("{step} failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: Box<ureq::Transport>,
    },
}

fn classify(step: Step, err: ureq::Error) -> PublishError {
    match err {
        ureq::Error::Status(status, response) => PublishError::Status {
            step,
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(source) => PublishError::Transport {
            step,
            source: Box::new(source),
        },
    }
}

/// Percent-encode a path segment, keeping the RFC3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for &b in segment.as_bytes() {
        let is_unreserved =
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~');
        if is_unreserved {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", b));
        }
    }
    out
}

#[derive(Debug, Clone)]
/// Addressing for one report: workspace, repo, commit, and report id.
pub struct ReportKey {
    pub workspace: String,
    pub repo_slug: String,
    pub commit: String,
    pub report_id: String,
}

impl ReportKey {
    pub fn new(env: &BitbucketEnv, report_id: String) -> Self {
        Self {
            workspace: env.workspace.clone(),
            repo_slug: env.repo_slug.clone(),
            commit: env.commit.clone(),
            report_id,
        }
    }

    /// REST path of the report resource itself.
    pub fn report_path(&self) -> String {
        format!(
            "/2.0/repositories/{}/{}/commit/{}/reports/{}",
            encode_path_segment(&self.workspace),
            encode_path_segment(&self.repo_slug),
            encode_path_segment(&self.commit),
            encode_path_segment(&self.report_id)
        )
    }

    /// REST path of the report's annotations collection.
    pub fn annotations_path(&self) -> String {
        format!("{}/annotations", self.report_path())
    }
}

/// Thin client over the platform's REST API.
///
/// Carries the base URL, the verbatim `Authorization` header value, and a
/// shared agent. No timeouts are configured; a hung call blocks only the
/// publish thread.
pub struct InsightsClient {
    base_url: String,
    auth: String,
    agent: ureq::Agent,
}

impl InsightsClient {
    pub fn new(base_url: impl Into<String>, auth: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            auth: auth.into(),
            agent: ureq::agent(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Authorization", &self.auth)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
    }

    /// DELETE the report currently attached to the commit, if any.
    pub fn delete_report(&self, key: &ReportKey) -> Result<(), PublishError> {
        self.request("DELETE", &key.report_path())
            .call()
            .map(|_| ())
            .map_err(|e| classify(Step::DeleteReport, e))
    }

    /// PUT (create or replace) the report payload.
    pub fn create_report(&self, key: &ReportKey, report: &Report) -> Result<(), PublishError> {
        self.request("PUT", &key.report_path())
            .send_json(report)
            .map(|_| ())
            .map_err(|e| classify(Step::CreateReport, e))
    }

    /// POST one batch of annotations (at most 100 items).
    pub fn create_annotations(
        &self,
        key: &ReportKey,
        batch: &[Annotation],
    ) -> Result<(), PublishError> {
        self.request("POST", &key.annotations_path())
            .send_json(batch)
            .map(|_| ())
            .map_err(|e| classify(Step::CreateAnnotations, e))
    }
}

/// Run the full delete → create → annotate sequence, logging each stage.
///
/// Every stage runs regardless of earlier failures; the first error is
/// returned after the last stage. The annotation stage stops at its first
/// failed batch.
pub fn publish(
    client: &InsightsClient,
    key: &ReportKey,
    report: &Report,
    annotations: &[Annotation],
) -> Result<(), PublishError> {
    let mut first_err: Option<PublishError> = None;

    eprintln!("✍️  deleting previous report {}…", key.report_id);
    match client.delete_report(key) {
        Ok(()) => eprintln!("✅ previous report deleted"),
        Err(e) => {
            eprintln!("❌ {}", e);
            first_err.get_or_insert(e);
        }
    }

    eprintln!("✍️  creating a new report…");
    match client.create_report(key, report) {
        Ok(()) => eprintln!("✅ report created"),
        Err(e) => {
            eprintln!("❌ {}", e);
            first_err.get_or_insert(e);
        }
    }

    if annotations.is_empty() {
        eprintln!("⚠️  no annotations to submit");
    } else {
        let total_batches = annotations.len().div_ceil(MAX_ANNOTATIONS_PER_REQUEST);
        eprintln!(
            "✍️  submitting {} {} in {} {}…",
            annotations.len(),
            pluralize("annotation", annotations.len()),
            total_batches,
            pluralize("request", total_batches),
        );
        let mut failed = false;
        for batch in annotations.chunks(MAX_ANNOTATIONS_PER_REQUEST) {
            if let Err(e) = client.create_annotations(key, batch) {
                eprintln!("❌ {}", e);
                first_err.get_or_insert(e);
                failed = true;
                break;
            }
        }
        if !failed {
            eprintln!("✅ annotations submitted");
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Kick off `publish` on a detached thread.
///
/// The caller gets control back immediately (the rendered lint output must
/// not wait on the network); join the handle before process exit so the
/// in-flight calls are not severed.
pub fn spawn_publish(
    client: InsightsClient,
    key: ReportKey,
    report: Report,
    annotations: Vec<Annotation>,
) -> std::thread::JoinHandle<Result<(), PublishError>> {
    std::thread::spawn(move || publish(&client, &key, &report, &annotations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::insights::{AnnotationSeverity, ReportResult, ANNOTATION_TYPE_BUG};
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn key() -> ReportKey {
        ReportKey {
            workspace: "acme".into(),
            repo_slug: "web".into(),
            commit: "deadbeef".into(),
            report_id: "stylelint-deadbeef".into(),
        }
    }

    fn report() -> Report {
        Report {
            title: "Stylelint Bitbucket Reporter".into(),
            logo_url: "https://stylelint.io/img/light.svg".into(),
            reporter: "Stylelint".into(),
            report_type: "TEST".into(),
            details: "0 problems\n0 errors\n0 warnings".into(),
            result: ReportResult::Passed,
        }
    }

    fn annotation(i: usize) -> Annotation {
        Annotation {
            external_id: format!("stylelint-deadbeef-a.css-1--{}", i),
            line: 1,
            path: "a.css".into(),
            summary: "finding".into(),
            annotation_type: ANNOTATION_TYPE_BUG.into(),
            severity: AnnotationSeverity::Medium,
        }
    }

    /// Serve one canned response per expected request on a loopback port,
    /// returning the observed request lines when done.
    fn serve(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, std::thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
            seen
        });
        (base_url, handle)
    }

    /// Read one HTTP request (head + content-length body), return its
    /// request line.
    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            if n == 0 {
                break buf.len();
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length: usize = head
            .lines()
            .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(str::to_string))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let mut body_read = buf.len() - head_end;
        while body_read < content_length {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            body_read += n;
        }
        head.lines().next().unwrap_or_default().to_string()
    }

    #[test]
    fn test_report_paths_encode_segments() {
        let k = ReportKey {
            workspace: "acme corp".into(),
            repo_slug: "web".into(),
            commit: "deadbeef".into(),
            report_id: "style/lint".into(),
        };
        assert_eq!(
            k.report_path(),
            "/2.0/repositories/acme%20corp/web/commit/deadbeef/reports/style%2Flint"
        );
        assert!(k.annotations_path().ends_with("/annotations"));
    }

    #[test]
    fn test_batches_cover_all_annotations() {
        let annotations: Vec<_> = (0..250).map(annotation).collect();
        let batches: Vec<_> = annotations.chunks(MAX_ANNOTATIONS_PER_REQUEST).collect();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() <= MAX_ANNOTATIONS_PER_REQUEST));
        let flattened: Vec<_> = batches
            .iter()
            .flat_map(|b| b.iter().map(|a| a.external_id.clone()))
            .collect();
        let original: Vec<_> = annotations.iter().map(|a| a.external_id.clone()).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_publish_happy_path_issues_three_calls() {
        let (base_url, server) = serve(vec![(200, "{}"), (200, "{}"), (200, "{}")]);
        let client = InsightsClient::new(base_url, "Bearer token");
        let annotations = vec![annotation(0)];
        publish(&client, &key(), &report(), &annotations).unwrap();
        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].starts_with("DELETE /2.0/repositories/acme/web/commit/deadbeef/reports/stylelint-deadbeef"));
        assert!(seen[1].starts_with("PUT /2.0/repositories/acme/web/commit/deadbeef/reports/stylelint-deadbeef"));
        assert!(seen[2].starts_with("POST /2.0/repositories/acme/web/commit/deadbeef/reports/stylelint-deadbeef/annotations"));
    }

    #[test]
    fn test_failed_deletion_still_creates_and_annotates() {
        let (base_url, server) = serve(vec![
            (404, "{\"error\": \"no report\"}"),
            (200, "{}"),
            (200, "{}"),
        ]);
        let client = InsightsClient::new(base_url, "Bearer token");
        let annotations = vec![annotation(0)];
        let err = publish(&client, &key(), &report(), &annotations).unwrap_err();
        match err {
            PublishError::Status { step, status, body } => {
                assert_eq!(step, Step::DeleteReport);
                assert_eq!(status, 404);
                assert!(body.contains("no report"));
            }
            other => panic!("unexpected error: {}", other),
        }
        // Later stages ran despite the failure.
        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_publish_batches_annotations_per_hundred() {
        // delete + create + ceil(250/100) annotation posts
        let (base_url, server) = serve(vec![
            (200, "{}"),
            (200, "{}"),
            (200, "{}"),
            (200, "{}"),
            (200, "{}"),
        ]);
        let client = InsightsClient::new(base_url, "Bearer token");
        let annotations: Vec<_> = (0..250).map(annotation).collect();
        publish(&client, &key(), &report(), &annotations).unwrap();
        let seen = server.join().unwrap();
        let posts = seen.iter().filter(|l| l.starts_with("POST ")).count();
        assert_eq!(posts, 3);
    }

    #[test]
    fn test_zero_annotations_skip_submission() {
        let (base_url, server) = serve(vec![(200, "{}"), (200, "{}")]);
        let client = InsightsClient::new(base_url, "Bearer token");
        publish(&client, &key(), &report(), &[]).unwrap();
        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|l| !l.starts_with("POST ")));
    }
}
