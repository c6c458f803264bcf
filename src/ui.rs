use crate::models::MALA_SIZE;

pub fn render_index() -> String {
    INDEX_HTML.replace("{{MALA_SIZE}}", &MALA_SIZE.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Japa Counter</title>
  <style>
    :root {
      --bg-1: #fff7ed;
      --bg-2: #fed7aa;
      --ink: #431407;
      --accent: #f97316;
      --accent-2: #9a3412;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(154, 52, 18, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffedd5 60%, #fffbeb 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
      color: var(--accent-2);
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    .subtitle {
      margin: 6px 0 0;
      color: #7c2d12;
    }

    select {
      font: inherit;
      padding: 10px 14px;
      border-radius: 12px;
      border: 1px solid rgba(154, 52, 18, 0.3);
      min-width: 240px;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(154, 52, 18, 0.1);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #9a7b6b;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .tap {
      appearance: none;
      border: none;
      border-radius: 24px;
      width: 100%;
      height: 200px;
      font-size: 1.6rem;
      font-weight: 700;
      color: white;
      background: var(--accent);
      box-shadow: 0 14px 30px rgba(249, 115, 22, 0.35);
      cursor: pointer;
      transition: transform 120ms ease;
    }

    .tap:active {
      transform: scale(0.98);
    }

    .tap:disabled {
      opacity: 0.5;
      cursor: not-allowed;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      background: white;
      border-radius: 12px;
      overflow: hidden;
      font-size: 0.95rem;
    }

    th, td {
      padding: 10px 12px;
      border-bottom: 1px solid rgba(154, 52, 18, 0.1);
      text-align: left;
    }

    th {
      background: #ffedd5;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.95rem;
    }

    .status[data-type="error"] {
      color: #b91c1c;
    }

    .status[data-type="ok"] {
      color: #15803d;
    }

    .notices {
      margin: 0;
      padding-left: 1.2em;
      font-size: 0.9rem;
    }

    .notices li[data-type="error"] {
      color: #b91c1c;
    }

    .notices li[data-type="ok"] {
      color: #15803d;
    }

    .hint {
      margin: 0;
      color: #7c6f65;
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Japa Counter</h1>
      <p class="subtitle">{{MALA_SIZE}} taps = 1 mala</p>
    </header>

    <section>
      <select id="practice"></select>
    </section>

    <section class="panel">
      <div class="stat">
        <span class="label">Current taps</span>
        <span id="current" class="value">0</span>
      </div>
      <div class="stat">
        <span class="label">Malas</span>
        <span id="malas" class="value">0</span>
      </div>
      <div class="stat">
        <span class="label">Lifetime taps</span>
        <span id="lifetime" class="value">0</span>
      </div>
      <div class="stat">
        <span class="label">Everyone, all time</span>
        <span id="total" class="value">0</span>
      </div>
    </section>

    <button id="tap" class="tap" type="button" disabled>Tap</button>
    <div class="status" id="status"></div>
    <ul class="notices" id="notices"></ul>

    <section>
      <h2>Daily totals</h2>
      <table>
        <thead><tr><th>Date</th><th>Practice</th><th>Count</th></tr></thead>
        <tbody id="daily"></tbody>
      </table>
    </section>

    <section>
      <h2>Leaderboard</h2>
      <table>
        <thead id="board-head"></thead>
        <tbody id="board"></tbody>
      </table>
    </section>

    <p class="hint">Progress is kept on this device. Each completed mala is sent to the shared counter once.</p>
  </main>

  <script>
    const practiceEl = document.getElementById('practice');
    const currentEl = document.getElementById('current');
    const malasEl = document.getElementById('malas');
    const lifetimeEl = document.getElementById('lifetime');
    const totalEl = document.getElementById('total');
    const tapEl = document.getElementById('tap');
    const statusEl = document.getElementById('status');
    const noticesEl = document.getElementById('notices');
    const dailyEl = document.getElementById('daily');
    const boardHeadEl = document.getElementById('board-head');
    const boardEl = document.getElementById('board');

    const NOTICE_POLL_MS = 500;
    const NOTICE_WAIT_MS = 120000;

    let practices = [];
    const pending = new Map();
    let polling = false;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const escapeHtml = (value) =>
      String(value).replace(/[&<>"']/g, (ch) => `&#${ch.charCodeAt(0)};`);

    const getJson = async (url) => {
      const res = await fetch(url);
      if (!res.ok) {
        throw new Error((await res.text()) || `Request to ${url} failed`);
      }
      return res.json();
    };

    const showProgress = (progress) => {
      currentEl.textContent = progress.current_taps;
      malasEl.textContent = progress.completed_units;
      lifetimeEl.textContent = progress.lifetime_taps.toLocaleString();
    };

    const showTotal = () => {
      const practice = practices.find((p) => p.id === practiceEl.value);
      totalEl.textContent = practice ? practice.total_count.toLocaleString() : '0';
    };

    const loadProgress = async () => {
      if (!practiceEl.value) {
        return;
      }
      showProgress(await getJson(`/api/practices/${encodeURIComponent(practiceEl.value)}/progress`));
      showTotal();
    };

    const loadPractices = async () => {
      practices = await getJson('/api/practices');
      practiceEl.innerHTML = practices
        .map((p) => `<option value="${escapeHtml(p.id)}">${escapeHtml(p.name)}</option>`)
        .join('');
      tapEl.disabled = practices.length === 0;
      await loadProgress();
    };

    const loadDaily = async () => {
      const rows = await getJson('/api/daily');
      dailyEl.innerHTML = rows.length
        ? rows
            .map((row) => `<tr><td>${escapeHtml(row.date)}</td><td>${escapeHtml(row.practice)}</td><td>${row.count}</td></tr>`)
            .join('')
        : '<tr><td colspan="3">No records yet</td></tr>';
    };

    const loadBoard = async () => {
      let view;
      try {
        view = await getJson('/api/dashboard');
      } catch (err) {
        boardEl.innerHTML = '<tr><td>Leaderboard unavailable</td></tr>';
        return;
      }
      boardHeadEl.innerHTML = `<tr><th>#</th><th>Name</th>${view.practices
        .map((p) => `<th>${escapeHtml(p.name)}</th>`)
        .join('')}<th>Total</th></tr>`;
      boardEl.innerHTML = view.leaderboard
        .map((row) => `<tr><td>${row.rank}</td><td>${escapeHtml(row.name)}</td>${row.counts
          .map((count) => `<td>${count}</td>`)
          .join('')}<td>${row.total}</td></tr>`)
        .join('');
    };

    const noticeKey = (practiceId, unit) => `${practiceId}#${unit}`;

    const showNotice = (notice) => {
      const type = notice.level === 'error' ? 'error' : 'ok';
      const item = document.createElement('li');
      item.textContent = notice.message;
      item.dataset.type = type;
      noticesEl.prepend(item);
      while (noticesEl.children.length > 10) {
        noticesEl.lastElementChild.remove();
      }
      setStatus(notice.message, type);
    };

    const pollNotices = async () => {
      if (polling) {
        return;
      }
      polling = true;
      try {
        while (pending.size > 0) {
          await new Promise((resolve) => setTimeout(resolve, NOTICE_POLL_MS));
          const notices = await getJson('/api/notices');
          notices.forEach((notice) => {
            showNotice(notice);
            pending.delete(noticeKey(notice.practice_id, notice.unit));
          });
          const now = Date.now();
          for (const [key, since] of pending) {
            if (now - since > NOTICE_WAIT_MS) {
              pending.delete(key);
              setStatus('Still waiting for the shared counter; check the leaderboard later', 'error');
            }
          }
        }
        loadBoard();
      } finally {
        polling = false;
      }
    };

    const tap = async () => {
      const res = await fetch(`/api/practices/${encodeURIComponent(practiceEl.value)}/tap`, { method: 'POST' });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Tap failed');
      }
      const body = await res.json();
      showProgress(body);
      if (!body.persisted) {
        setStatus('Progress is only kept until this page closes', 'error');
      }
      if (body.completed) {
        setStatus('Mala complete, saving...', 'ok');
        if (body.sync === 'dispatched') {
          pending.set(noticeKey(body.practice_id, body.completed_units), Date.now());
          pollNotices().catch((err) => setStatus(err.message, 'error'));
        }
      }
    };

    practiceEl.addEventListener('change', () => loadProgress().catch((err) => setStatus(err.message, 'error')));
    tapEl.addEventListener('click', () => tap().catch((err) => setStatus(err.message, 'error')));

    loadPractices().catch((err) => setStatus(err.message, 'error'));
    loadDaily().catch((err) => setStatus(err.message, 'error'));
    loadBoard();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mentions_the_mala_size() {
        let html = render_index();
        assert!(html.contains("108 taps = 1 mala"));
        assert!(!html.contains("{{MALA_SIZE}}"));
    }

    #[test]
    fn page_waits_for_the_notice_of_the_dispatched_unit() {
        let html = render_index();
        assert!(html.contains("body.sync === 'dispatched'"));
        assert!(html.contains("pending.set(noticeKey(body.practice_id, body.completed_units)"));
        assert!(html.contains("notices.forEach((notice) =>"));
        assert!(html.contains("while (pending.size > 0)"));
        assert!(html.contains(r#"<ul class="notices" id="notices">"#));
    }
}
