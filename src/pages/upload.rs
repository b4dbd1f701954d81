use super::{pick, text};
use crate::form::FieldDef;
use crate::lifecycle::CallSpec;
use crate::sdk::SdkError;
use crate::services::AttachmentService;
use futures::FutureExt;
use serde_json::json;

pub(super) fn specs() -> Vec<CallSpec> {
    vec![CallSpec::new("StorageService", "uploadFile")
        .summary("Upload a local file and get back its URL")
        .field(
            FieldDef::text("file", "File")
                .required()
                .help("A local path, a data: URL or base64 data"),
        )
        .field(FieldDef::text("sceneName", "Scene"))
        .defaults(json!({ "file": "Cargo.toml", "sceneName": "default" }))
        .build(|values| Ok(pick(values, &["file", "sceneName"])))
        .call(|sdk, args| {
            async move {
                // The file is read at call time so the preview stays cheap.
                let encoded = AttachmentService::encode(text(&args, "file"))
                    .await
                    .map_err(|err| SdkError::Local(err.to_string()))?;
                let scene = match text(&args, "sceneName") {
                    "" => "default",
                    scene => scene,
                };
                sdk.invoke(
                    "StorageService.uploadFile",
                    json!({
                        "fileName": encoded.file_name,
                        "dataUrl": encoded.data_url,
                        "sceneName": scene,
                    }),
                )
                .await
            }
            .boxed()
        })
        .view(|output| vec![format!("{} ({} bytes)", text(output, "url"), output["size"].as_u64().unwrap_or(0))])]
}
