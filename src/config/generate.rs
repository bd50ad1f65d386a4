/// Returns the commented starter config written by `streamgate config init`.
pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# STREAMGATE CONFIGURATION
# =============================================================================
# Streamgate resolves a log-event coordinate (stream + event index, or
# archive + timestamp) to an extracted stream artifact. When no artifact
# covers the coordinate yet it submits an extraction job to the job record
# store and waits for the execution system to finish it.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/streamgate/config.yml
#   3. /etc/streamgate/config.yml

web:
  # Address the HTTP server binds to
  listen: "127.0.0.1:7301"

  # Optional directory of static viewer assets served as a fallback
  # client_dir: /srv/streamgate/client

viewer:
  # Viewer page the client is redirected to once an artifact is resolved
  url_prefix: /log-viewer/index.html

# Job-completion polling. The first poll happens after 'interval'; the delay
# doubles per attempt (capped at 5s) until 'max_wait' elapses.
polling:
  interval: 500ms
  max_wait: 60s

# Optional object storage. When present, artifact paths of the form
# s3://bucket/key are returned with a fresh pre-signed URL (3600s validity).
# Credentials come from the standard AWS environment/profile chain. Omit the
# section entirely to serve artifacts by local path only.
# s3:
#   region: us-east-2
"#
    .to_string()
}
