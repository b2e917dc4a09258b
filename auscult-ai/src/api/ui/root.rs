//! Root page handler - recording upload and diagnosis page

use axum::response::{Html, IntoResponse};

/// GET /
///
/// Upload form, waveform preview and result panel; talks to `POST /predict`
/// from `/static/app.js`.
pub async fn root_page() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");
    let build_timestamp = env!("BUILD_TIMESTAMP");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Auscult - Heart &amp; Lung Sound Analysis</title>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>Auscult</h1>
                <p class="subtitle">Heart and lung sound classification</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">auscult-ai v{version}</div>
                <div class="build-info-line">{git_hash} ({build_profile})</div>
                <div class="build-info-line">{build_timestamp}</div>
            </div>
        </div>
    </header>
    <main class="content">
        <section class="panel">
            <h2>Recording</h2>
            <input type="file" id="audioFileInput" accept="audio/*">
            <audio id="audioPlayer" class="hidden" controls></audio>
            <canvas id="waveform" width="800" height="100"></canvas>
            <div class="actions">
                <button id="startRecordButton" class="button">Record</button>
                <button id="stopRecordButton" class="button" disabled>Stop</button>
                <button id="uploadButton" class="button primary">Analyze</button>
            </div>
            <audio id="recordedAudioPlayer" class="hidden" controls></audio>
        </section>

        <div id="loading" class="hidden">Analyzing recording...</div>
        <div id="error" class="error hidden"></div>

        <section class="panel">
            <h2>Result</h2>
            <p>Predicted condition: <span id="predictedCondition">N/A</span></p>
            <p>Recommendation: <span id="recommendation">N/A</span></p>
            <p class="secondary">
                Random forest: <span id="rfPrediction">N/A</span> &middot;
                CNN-LSTM: <span id="cnnLstmPrediction">N/A</span>
            </p>
        </section>
    </main>
    <script src="/static/app.js"></script>
</body>
</html>"#
    ))
}
