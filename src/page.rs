pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ProductLens AI</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f172a; color: #e2e8f0; margin: 0; }
        header { padding: 16px 24px; border-bottom: 1px solid #1e293b; }
        main { max-width: 860px; margin: 0 auto; padding: 40px 20px; }
        .view { display: none; }
        .view.active { display: block; }
        .upload-area { border: 2px dashed #334155; border-radius: 16px; padding: 80px 20px; text-align: center; cursor: pointer; }
        .upload-area.dragover { border-color: #6366f1; background: rgba(99, 102, 241, 0.1); }
        input[type="file"] { display: none; }
        .error { margin-top: 24px; padding: 16px; border: 1px solid rgba(239, 68, 68, 0.3); border-radius: 8px; color: #fca5a5; display: none; }
        .analyzing { text-align: center; }
        .analyzing img { width: 128px; height: 128px; object-fit: cover; border-radius: 50%; opacity: 0.5; }
        .result img { max-width: 100%; border-radius: 12px; }
        .result pre { white-space: pre-wrap; font-family: inherit; line-height: 1.6; }
        button { background: #4f46e5; color: white; border: 0; border-radius: 8px; padding: 10px 18px; cursor: pointer; }
    </style>
</head>
<body>
    <header><strong>ProductLens AI</strong> &middot; Multimodal Intelligence Assistant</header>
    <main>
        <section class="view" id="uploadView">
            <h2>Decode any product instantly.</h2>
            <div class="upload-area" id="uploadArea">
                <p>Drop your product image here</p>
                <p>or click to browse files (JPG, PNG, WEBP)</p>
                <input type="file" id="fileInput" accept="image/*">
            </div>
            <div class="error" id="error"></div>
        </section>

        <section class="view analyzing" id="analyzingView">
            <img id="analyzingPreview" alt="Analyzing">
            <h3>Analyzing Product...</h3>
            <p>Identifying specs, brand, and market data</p>
        </section>

        <section class="view result" id="resultView">
            <img id="resultPreview" alt="Product">
            <pre id="resultText"></pre>
            <button id="resetButton">Analyze another product</button>
        </section>
    </main>

    <script>
        const $ = (id) => document.getElementById(id);
        const views = { UPLOAD: $('uploadView'), ANALYZING: $('analyzingView'), RESULT: $('resultView') };
        let uploading = false;

        function show(view) {
            for (const [name, el] of Object.entries(views)) {
                el.classList.toggle('active', name === view);
            }
        }

        function render(snapshot) {
            show(snapshot.view);
            const outcome = snapshot.outcome;
            const failed = outcome && outcome.status === 'failure';
            $('error').textContent = failed ? 'Analysis Failed: ' + outcome.message : '';
            $('error').style.display = failed ? 'block' : 'none';
            if (snapshot.image) {
                $('analyzingPreview').src = snapshot.image.preview;
                $('resultPreview').src = snapshot.image.preview;
            }
            if (outcome && outcome.status === 'success') {
                $('resultText').textContent = outcome.text;
            }
            // Started elsewhere (or before a reload): follow it until it settles.
            if (snapshot.view === 'ANALYZING' && !uploading) {
                setTimeout(refresh, 1000);
            }
        }

        function refresh() {
            fetch('/api/state').then((r) => r.json()).then(render).catch(() => show('UPLOAD'));
        }

        function renderError(message) {
            render({ view: 'UPLOAD', image: null, outcome: { status: 'failure', message } });
        }

        async function handleFile(file) {
            const reader = new FileReader();
            reader.onload = (e) => { $('analyzingPreview').src = e.target.result; };
            reader.readAsDataURL(file);
            show('ANALYZING');

            const formData = new FormData();
            formData.append('image', file);
            uploading = true;
            try {
                const response = await fetch('/api/analyze', { method: 'POST', body: formData });
                const body = await response.json();
                if (!response.ok) {
                    throw new Error(body.error || 'Upload failed');
                }
                render(body);
            } catch (error) {
                renderError(error.message);
            } finally {
                uploading = false;
            }
        }

        async function post(path) {
            const response = await fetch(path, { method: 'POST' });
            render(await response.json());
        }

        const uploadArea = $('uploadArea');
        uploadArea.addEventListener('click', () => $('fileInput').click());
        uploadArea.addEventListener('dragover', (e) => { e.preventDefault(); uploadArea.classList.add('dragover'); });
        uploadArea.addEventListener('dragleave', (e) => { e.preventDefault(); uploadArea.classList.remove('dragover'); });
        uploadArea.addEventListener('drop', (e) => {
            e.preventDefault();
            uploadArea.classList.remove('dragover');
            if (e.dataTransfer.files && e.dataTransfer.files[0]) {
                handleFile(e.dataTransfer.files[0]);
            }
        });
        $('fileInput').addEventListener('change', (e) => {
            if (e.target.files && e.target.files[0]) {
                handleFile(e.target.files[0]);
                e.target.value = '';
            }
        });
        $('resetButton').addEventListener('click', () => post('/api/reset'));

        refresh();
    </script>
</body>
</html>
"#;
