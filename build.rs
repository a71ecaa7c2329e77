use std::env;
use std::fs;
use std::path::Path;

const PLACEHOLDER_INDEX: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>%SITE_NAME%</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 560px; margin: 80px auto; padding: 0 20px; }
        .note { background: #fff8e1; border: 1px solid #ffe082; border-radius: 8px; padding: 16px 20px; }
        code { background: #f1f3f4; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>%SITE_NAME%</h1>
    <div class="note">
        <p>Frontend belum dibangun. API tetap tersedia di <code>/api/v1</code>.</p>
        <p><code>cd frontend &amp;&amp; npm install &amp;&amp; npm run build</code></p>
    </div>
</body>
</html>
"#;

fn main() {
    println!("cargo:rerun-if-changed=frontend/dist");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        panic!("CARGO_MANIFEST_DIR is not set");
    };
    let dist = Path::new(&manifest_dir).join("frontend/dist");

    // rust-embed 要求目录在编译期存在
    if !dist.join("index.html").exists() {
        println!("cargo:warning=frontend/dist not found, embedding placeholder page");
        write_placeholder(&dist);
    }
}

fn write_placeholder(dist: &Path) {
    fs::create_dir_all(dist.join("assets")).expect("Failed to create frontend/dist");
    fs::write(dist.join("index.html"), PLACEHOLDER_INDEX)
        .expect("Failed to write placeholder index.html");
}
