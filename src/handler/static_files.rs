//! Static file serving module
//!
//! Serves the accompanying front end for any GET/HEAD request outside the
//! API surface. Falls back to an embedded editor page when the front-end
//! directory has no index file.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;

/// Serve a static file, the embedded front end, or 404
pub async fn serve(state: &Arc<AppState>, path: &str, is_head: bool) -> Response<Full<Bytes>> {
    let config = &state.config.static_files;
    if let Some((content, content_type)) =
        load_from_directory(&config.dir, path, &config.index_files).await
    {
        return http::build_static_file_response(content, content_type, is_head);
    }

    if path == "/" {
        let html = default_front_end();
        return http::build_static_file_response(
            html.into_bytes(),
            "text/html; charset=utf-8",
            is_head,
        );
    }

    http::build_404_response()
}

/// Load a static file from the front-end directory with index file support
pub async fn load_from_directory(
    static_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");
    let mut file_path = Path::new(static_dir).join(&clean_path);

    let static_dir_canonical = Path::new(static_dir).canonicalize().ok()?;

    // Directory request: try index files
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        for index_file in index_files {
            let index_path = file_path.join(index_file);
            if index_path.is_file() {
                file_path = index_path;
                break;
            }
        }
    }

    // File not found is common (404), no need to log at warning level
    let file_path_canonical = file_path.canonicalize().ok()?;
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    let content = fs::read(&file_path).await.ok()?;
    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Embedded front end: file list plus a plain-text editor driving the API
fn default_front_end() -> String {
    String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Filepad</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #f5f5f5;
            color: #333;
            display: flex;
            min-height: 100vh;
        }
        aside {
            width: 260px;
            background: #2d2d2d;
            color: #f8f8f2;
            padding: 20px;
        }
        aside h1 { font-size: 1.3em; margin-bottom: 15px; }
        #files { list-style: none; }
        #files li {
            padding: 6px 8px;
            border-radius: 4px;
            cursor: pointer;
            display: flex;
            justify-content: space-between;
        }
        #files li:hover { background: #444; }
        #files li .size { opacity: 0.6; font-size: 0.85em; }
        main { flex: 1; padding: 20px; display: flex; flex-direction: column; }
        .toolbar { display: flex; gap: 8px; margin-bottom: 12px; }
        .toolbar input {
            flex: 1;
            padding: 8px;
            border: 1px solid #ccc;
            border-radius: 4px;
        }
        .toolbar button {
            padding: 8px 16px;
            border: none;
            border-radius: 4px;
            background: #667eea;
            color: white;
            cursor: pointer;
        }
        .toolbar button:hover { background: #5a6fd8; }
        textarea {
            flex: 1;
            padding: 12px;
            border: 1px solid #ccc;
            border-radius: 4px;
            font-family: "Courier New", monospace;
            font-size: 0.95em;
            resize: none;
        }
        #status { margin-top: 8px; min-height: 1.2em; font-size: 0.9em; opacity: 0.8; }
    </style>
</head>
<body>
    <aside>
        <h1>Filepad</h1>
        <ul id="files"></ul>
    </aside>
    <main>
        <div class="toolbar">
            <input id="name" placeholder="filename.txt">
            <button id="save">Save</button>
            <button id="del">Delete</button>
            <button id="reload">Reload</button>
        </div>
        <textarea id="content" spellcheck="false"></textarea>
        <div id="status"></div>
    </main>
    <script>
        const nameInput = document.getElementById('name');
        const content = document.getElementById('content');
        const status = document.getElementById('status');

        function setStatus(msg) { status.textContent = msg; }

        async function refreshList() {
            const res = await fetch('/list');
            const files = await res.json();
            const ul = document.getElementById('files');
            ul.innerHTML = '';
            for (const f of files) {
                const li = document.createElement('li');
                const name = document.createElement('span');
                name.textContent = f.name;
                const size = document.createElement('span');
                size.className = 'size';
                size.textContent = f.size + ' B';
                li.appendChild(name);
                li.appendChild(size);
                li.onclick = () => openFile(f.name);
                ul.appendChild(li);
            }
        }

        async function openFile(name) {
            const res = await fetch('/files?name=' + encodeURIComponent(name));
            if (!res.ok) { setStatus(await res.text()); return; }
            nameInput.value = name;
            content.value = await res.text();
            setStatus('Opened ' + name);
        }

        document.getElementById('save').onclick = async () => {
            const name = nameInput.value.trim();
            const res = await fetch('/files?name=' + encodeURIComponent(name), {
                method: 'PUT',
                headers: { 'Content-Type': 'text/plain; charset=utf-8' },
                body: content.value
            });
            if (!res.ok) { setStatus(await res.text()); return; }
            const result = await res.json();
            setStatus((result.created ? 'Created ' : 'Saved ') + result.saved + ' (' + result.size + ' bytes)');
            refreshList();
        };

        document.getElementById('del').onclick = async () => {
            const name = nameInput.value.trim();
            const res = await fetch('/files?name=' + encodeURIComponent(name), { method: 'DELETE' });
            if (!res.ok && res.status !== 201) { setStatus(await res.text()); return; }
            const result = await res.json();
            setStatus(result.existed ? 'Deleted ' + result.deleted : 'No such file');
            content.value = '';
            refreshList();
        };

        document.getElementById('reload').onclick = refreshList;
        refreshList();
    </script>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_existing_file() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("app.css"), "body {}").expect("write css");

        let static_dir = dir.path().to_string_lossy().into_owned();
        let (content, content_type) = load_from_directory(&static_dir, "/app.css", &[])
            .await
            .expect("file should load");
        assert_eq!(content, b"body {}");
        assert_eq!(content_type, "text/css");
    }

    #[tokio::test]
    async fn test_index_file_resolution() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("write index");

        let static_dir = dir.path().to_string_lossy().into_owned();
        let index_files = vec!["index.html".to_string()];
        let (content, content_type) = load_from_directory(&static_dir, "/", &index_files)
            .await
            .expect("index should load");
        assert_eq!(content, b"<html></html>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let static_dir = dir.path().to_string_lossy().into_owned();
        assert!(load_from_directory(&static_dir, "/absent.html", &[])
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let dir = TempDir::new().expect("tempdir");
        let sub = dir.path().join("public");
        std::fs::create_dir(&sub).expect("create subdir");
        std::fs::write(dir.path().join("secret.txt"), "secret").expect("write secret");

        let static_dir = sub.to_string_lossy().into_owned();
        assert!(load_from_directory(&static_dir, "/../secret.txt", &[])
            .await
            .is_none());
        assert!(load_from_directory(&static_dir, "/%2e%2e/secret.txt", &[])
            .await
            .is_none());
    }
}
