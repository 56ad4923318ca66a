use crate::electricity::{ElectricityLedger, MONTH_LABELS};
use crate::mode::GraphMode;
use crate::models::{BarComparison, ImpactPanel, RenderedGraph, ResultView, Screen};
use crate::tracker::Tracker;

pub fn render_index(tracker: &Tracker) -> String {
    let counters = tracker.counters();
    let screen = match tracker.screen() {
        Screen::Main => MAIN_SECTION.to_string(),
        Screen::Settings { goal } => SETTINGS_SECTION.replace("{{GOAL}}", &goal.to_string()),
        Screen::Result(view) => render_result(view),
        Screen::ConfirmReset { prompt } => CONFIRM_RESET_SECTION.replace("{{PROMPT}}", &escape(prompt)),
    };

    PAGE_HTML
        .replace("{{TITLE}}", "Bag Refusal Tracker")
        .replace("{{STYLE}}", BASE_STYLE)
        .replace(
            "{{BODY}}",
            &INDEX_BODY
                .replace("{{CO2}}", &counters.total_co2_saved)
                .replace("{{REFUSALS}}", &counters.refusal_count.to_string())
                .replace("{{BOUGHT}}", &counters.bought_count.to_string())
                .replace("{{SCREEN}}", &screen)
                .replace("{{TILES}}", &render_tiles(tracker)),
        )
}

fn render_result(view: &ResultView) -> String {
    let graph = match &view.graph {
        RenderedGraph::Bars(bars) => render_bars(bars),
        RenderedGraph::Impact(panel) => render_impact(panel),
    };
    format!(
        r#"<section class="result" id="result-view" data-mode="{mode}">
      <h2 id="result-message-large">{headline}</h2>
      {graph}
    </section>"#,
        mode = view.mode,
        headline = escape(view.headline()),
    )
}

fn render_bars(bars: &BarComparison) -> String {
    format!(
        r#"<div class="bars">
        <div class="bar-slot">
          <span class="bar-value" id="bar-1-value">{pv}</span>
          <div class="bar primary" id="bar-1" style="height: {ph:.1}%"></div>
          <span class="bar-label" id="bar-1-label">{pl}</span>
        </div>
        <div class="bar-slot">
          <span class="bar-value" id="bar-2-value">{sv}</span>
          <div class="bar secondary" id="bar-2" style="height: {sh:.1}%"></div>
          <span class="bar-label" id="bar-2-label">{sl}</span>
        </div>
      </div>
      <p class="comment" id="result-comment">{comment}</p>"#,
        pv = escape(&bars.primary_value),
        ph = bars.primary_height_pct,
        pl = escape(&bars.primary_label),
        sv = escape(&bars.secondary_value),
        sh = bars.secondary_height_pct,
        sl = escape(&bars.secondary_label),
        comment = escape(&bars.comment_text),
    )
}

fn render_impact(panel: &ImpactPanel) -> String {
    format!(
        r#"<div class="comment" id="result-comment">
        <p>The CO2 you have saved so far is equal to</p>
        <p>what roughly <strong id="impact-trees">{trees} trees</strong> absorb in a year,</p>
        <p>or driving a car for about <strong id="impact-km">{km} km</strong>.</p>
      </div>"#,
        trees = escape(&panel.trees_text),
        km = escape(&panel.km_text),
    )
}

fn render_tiles(tracker: &Tracker) -> String {
    let current = tracker.graph_mode();
    tracker
        .enabled_modes()
        .into_iter()
        .map(|mode| tile(mode, mode == current))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tile(mode: GraphMode, active: bool) -> String {
    let class = if active { "tile active" } else { "tile" };
    format!(
        r#"<form method="post" action="/mode/{mode}"><button class="{class}" type="submit" data-graph-type="{mode}">{title}</button></form>"#,
        title = mode.title(),
    )
}

pub fn render_electricity(ledger: &ElectricityLedger, current_month: u32) -> String {
    let summary = ledger.summarize();
    let inputs = ledger
        .months()
        .iter()
        .enumerate()
        .map(|(index, kwh)| {
            let month = index + 1;
            let class = if month as u32 == current_month {
                "month current"
            } else {
                "month"
            };
            format!(
                r#"<label class="{class}">{label}<input type="number" min="0" step="0.1" id="month-{month}" name="month-{month}" value="{kwh}" /></label>"#,
                label = MONTH_LABELS[index],
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    PAGE_HTML
        .replace("{{TITLE}}", "Electricity Usage")
        .replace("{{STYLE}}", BASE_STYLE)
        .replace(
            "{{BODY}}",
            &ELECTRICITY_BODY
                .replace("{{INPUTS}}", &inputs)
                .replace("{{TOTAL_KWH}}", &summary.total_kwh_text)
                .replace("{{TOTAL_CO2}}", &summary.total_co2_kg_text),
        )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
{{BODY}}
  </main>
</body>
</html>
"#;

const BASE_STYLE: &str = r#"
    :root {
      --bg: #eef6ee;
      --ink: #23302a;
      --accent: #4caf50;
      --warn: #f44336;
      --muted: #e0e0e0;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 20px 50px rgba(35, 48, 42, 0.15);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--bg), #ffffff 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 28px 16px 40px;
    }

    .app {
      width: min(720px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 { margin: 0; font-size: clamp(1.8rem, 4vw, 2.4rem); }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 14px;
    }

    .stat {
      background: white;
      border-radius: 16px;
      padding: 16px;
      border: 1px solid rgba(35, 48, 42, 0.08);
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #7d857f;
    }

    .stat .value { font-size: 1.6rem; font-weight: 600; }

    .actions, .tiles, .nav {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--muted);
    }

    .btn-refuse { background: var(--accent); color: white; }
    .btn-buy { background: var(--warn); color: white; }
    .tile.active { outline: 3px solid var(--accent); }

    .bars {
      height: 220px;
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 24px;
      align-items: end;
    }

    .bar-slot {
      height: 100%;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
      gap: 6px;
    }

    .bar { width: 60%; border-radius: 10px 10px 0 0; }
    .bar.primary { background: var(--accent); }
    .result[data-mode="whatIf"] .bar.primary { background: var(--warn); }
    .bar.secondary { background: var(--muted); }

    .months {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(110px, 1fr));
      gap: 10px;
    }

    .month { display: grid; gap: 4px; font-size: 0.9rem; }
    .month.current { font-weight: 700; color: var(--accent); }
    .month input { padding: 8px; border-radius: 8px; border: 1px solid #c9d3cc; }

    svg { width: 100%; height: auto; background: white; border-radius: 16px; }
    .line-kwh { fill: none; stroke: var(--accent); stroke-width: 3; }
    .line-co2 { fill: none; stroke: var(--warn); stroke-width: 3; }
"#;

const INDEX_BODY: &str = r#"    <header>
      <h1>Bag Refusal Tracker</h1>
      <nav class="nav"><a href="/electricity">Electricity usage</a></nav>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">CO2 saved (g)</span>
        <span id="total-co2" class="value">{{CO2}}</span>
      </div>
      <div class="stat">
        <span class="label">Refused</span>
        <span id="refusal-count" class="value">{{REFUSALS}}</span>
      </div>
      <div class="stat">
        <span class="label">Bought</span>
        <span id="bought-count" class="value">{{BOUGHT}}</span>
      </div>
    </section>

    {{SCREEN}}

    <section class="tiles" aria-label="Graph type">
      {{TILES}}
    </section>

    <section class="nav">
      <form method="post" action="/settings"><button type="submit" id="settings-btn">Settings</button></form>
      <form method="post" action="/back"><button type="submit" class="back-btn">Back</button></form>
      <form method="post" action="/reset"><button type="submit" id="reset-data-btn">Reset data</button></form>
    </section>"#;

const MAIN_SECTION: &str = r#"<section class="actions" id="main-view">
      <form method="post" action="/refuse"><button class="btn-refuse" id="refused-btn" type="submit">I refused a bag</button></form>
      <form method="post" action="/buy"><button class="btn-buy" id="bought-btn" type="submit">I bought a bag</button></form>
    </section>"#;

const SETTINGS_SECTION: &str = r#"<section id="settings-view">
      <form method="post" action="/settings/goal" class="actions">
        <label>Monthly goal <input type="number" min="1" id="goal-input" name="goal" value="{{GOAL}}" /></label>
        <button type="submit" id="save-goal-btn">Save goal</button>
      </form>
    </section>"#;

const CONFIRM_RESET_SECTION: &str = r#"<section id="confirm-reset-view">
      <p class="comment">{{PROMPT}}</p>
      <form method="post" action="/reset/confirm" class="actions">
        <button type="submit" name="confirm" value="yes" class="btn-buy" id="confirm-reset-btn">Reset</button>
        <button type="submit" name="confirm" value="no" class="btn-refuse" id="cancel-reset-btn">Cancel</button>
      </form>
    </section>"#;

const ELECTRICITY_BODY: &str = r#"    <header>
      <h1>Electricity Usage</h1>
      <nav class="nav"><a href="/">Back to bag tracker</a></nav>
    </header>

    <form method="post" action="/electricity/save">
      <div class="months">
        {{INPUTS}}
      </div>
      <div class="actions">
        <button type="submit" class="btn-refuse" id="save-electricity-data-btn">Save</button>
      </div>
    </form>

    <section class="panel">
      <div class="stat">
        <span class="label">Total (kWh)</span>
        <span id="total-kwh" class="value">{{TOTAL_KWH}}</span>
      </div>
      <div class="stat">
        <span class="label">CO2 (kg)</span>
        <span id="total-co2-kg" class="value">{{TOTAL_CO2}}</span>
      </div>
    </section>

    <svg id="electricity-chart" viewBox="0 0 600 220" role="img" aria-label="Usage per month"></svg>
    <svg id="co2-chart" viewBox="0 0 600 220" role="img" aria-label="CO2 per month"></svg>

    <script>
      const drawLine = (svg, values, className) => {
        const width = 600;
        const height = 220;
        const pad = 30;
        const max = Math.max(1, ...values);
        const step = (width - pad * 2) / (values.length - 1);
        const y = (value) => height - pad - (value / max) * (height - pad * 2);
        const path = values
          .map((value, index) => `${index === 0 ? 'M' : 'L'} ${(pad + index * step).toFixed(2)} ${y(value).toFixed(2)}`)
          .join(' ');
        svg.innerHTML = `<path class="${className}" d="${path}" />`;
      };

      const refresh = async () => {
        const res = await fetch('/api/electricity');
        if (!res.ok) {
          return;
        }
        const data = await res.json();
        drawLine(document.getElementById('electricity-chart'), data.chart.kwh, 'line-kwh');
        drawLine(document.getElementById('co2-chart'), data.chart.co2_kg, 'line-co2');
        document.getElementById('total-kwh').textContent = data.summary.total_kwh_text;
        document.getElementById('total-co2-kg').textContent = data.summary.total_co2_kg_text;
      };

      document.querySelectorAll('.month input').forEach((input, index) => {
        input.addEventListener('input', async () => {
          if (input.value !== '' && parseFloat(input.value) < 0) {
            input.value = 0;
          }
          await fetch(`/api/electricity/${index + 1}`, {
            method: 'PUT',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify({ value: parseFloat(input.value) || 0 })
          });
          refresh();
        });
      });

      refresh();
    </script>"#;
