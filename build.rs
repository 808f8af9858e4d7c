fn main() {
    tauri_build::try_build(tauri_build::Attributes::new().app_manifest(
        tauri_build::AppManifest::new().commands(&[
            "secure_storage_encrypt",
            "secure_storage_decrypt",
            "shell_content_ready",
            "shell_heartbeat",
            "shell_get_status",
        ]),
    ))
    .expect("failed to run tauri-build");
}
