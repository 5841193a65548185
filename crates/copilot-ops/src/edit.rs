use crate::ai::ModelClient;
use crate::filemap::{dump, print_or_write_out};
use crate::prelude::*;
use crate::request::{prepare, RequestArgs};
use copilot_ops_core::ai::{BackendError, Capability};
use copilot_ops_core::filemap::decode;
use copilot_ops_core::prompt::build_edit_instruction;

#[derive(Debug, Clone, clap::Args)]
pub struct EditOptions {
    #[clap(flatten)]
    pub request: RequestArgs,

    /// File to edit
    #[arg(short = 'f', long = "file")]
    pub file: String,
}

pub async fn run(options: EditOptions, global: crate::Global) -> Result<()> {
    let args = &options.request;
    let request = prepare(args, std::slice::from_ref(&options.file), &[], &global)?;

    if request.filemap.is_empty() {
        return Err(Error::NothingToEdit(options.file.clone()).into());
    }
    request.client.require(Capability::Edit)?;

    let instruction = build_edit_instruction(&args.request);
    let candidates = request
        .client
        .edit(&request.filemap_text, &instruction)
        .await?;
    let output = candidates.first().ok_or(BackendError::EmptyChoices)?;

    let mut filemap = request.filemap;
    let applied = decode(output, &mut filemap).context("Failed to decode the edited files")?;
    log::info!("edit updated {} file(s)", applied);

    if global.verbose {
        dump("Edited files", &filemap);
    }

    print_or_write_out(&mut filemap, args.write, args.output, &args.output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{global_with_config, WORKING_DIR};
    use clap::Parser;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{any, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn edit_options(root: &str, file: &str, extra: &[&str]) -> EditOptions {
        let mut argv = vec![
            "edit",
            "-r",
            "Increase the size of the PVC to 100Gi",
            "-p",
            root,
            "-f",
            file,
        ];
        argv.extend_from_slice(extra);
        TestApp::parse_from(argv).options
    }

    #[derive(Debug, clap::Parser)]
    struct TestApp {
        #[clap(flatten)]
        options: EditOptions,
    }

    #[test]
    fn test_edit_flags() {
        let options = TestApp::parse_from([
            "edit",
            "-f",
            "examples/app1/mysql-pvc.yaml",
            "-r",
            "Increase the size of the PVC to 100Gi",
            "-w",
        ])
        .options;

        assert_eq!(options.file, "examples/app1/mysql-pvc.yaml");
        assert!(options.request.write);
    }

    #[test]
    fn test_edit_requires_file() {
        assert!(TestApp::try_parse_from(["edit", "-r", "x"]).is_err());
    }

    #[tokio::test]
    async fn test_edit_writes_back_to_loaded_file() {
        let _cwd = WORKING_DIR.lock().await;
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pvc.yaml"), "storage: 1Gi\n").unwrap();
        let global = global_with_config(temp_dir.path(), "openai:\n  apiKey: sk-test\n");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/edits"))
            .and(body_partial_json(json!({"input": "# @pvc.yaml\nstorage: 1Gi\n\n"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "edit",
                "choices": [{"text": "# @pvc.yaml\nstorage: 100Gi\n", "index": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let root = temp_dir.path().display().to_string();
        let uri = server.uri();
        let options = edit_options(
            &root,
            "pvc.yaml",
            &["-w", "--backend", "gpt-3", "--url", uri.as_str()],
        );

        run(options, global).await.unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("pvc.yaml")).unwrap(),
            "storage: 100Gi\n"
        );
        assert!(!temp_dir.path().join("generated-by-copilot-ops").exists());
    }

    #[tokio::test]
    async fn test_edit_with_no_matching_file() {
        let _cwd = WORKING_DIR.lock().await;
        let temp_dir = TempDir::new().unwrap();
        let global = global_with_config(temp_dir.path(), "");

        let root = temp_dir.path().display().to_string();
        let options = edit_options(&root, "missing-*.yaml", &["--backend", "gpt-j"]);

        let err = run(options, global).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NothingToEdit(glob)) if glob == "missing-*.yaml"
        ));
    }

    #[tokio::test]
    async fn test_edit_on_gptj_fails_before_sending() {
        let _cwd = WORKING_DIR.lock().await;
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pvc.yaml"), "storage: 1Gi\n").unwrap();
        let global = global_with_config(temp_dir.path(), "");

        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let root = temp_dir.path().display().to_string();
        let uri = server.uri();
        let options = edit_options(
            &root,
            "pvc.yaml",
            &["--backend", "gpt-j", "--url", uri.as_str()],
        );

        let err = run(options, global).await.unwrap_err();
        let err = err.downcast_ref::<BackendError>().unwrap();
        assert!(err.is_not_implemented());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("pvc.yaml")).unwrap(),
            "storage: 1Gi\n"
        );
    }
}
