// location-bingo/src/page.rs
// Server-side HTML for the bingo page. Dialogs open through URL fragments
// (`#bingo`, `#share`) so no script is needed except for the copy button.

use std::fmt::Write as _;

use url::Url;

use crate::controller::BoardController;
use crate::defs::{CELLCOUNT, CELEBRATION_DURATION, FREE_CELL, GRIDCONFIG, RESET_PROMPT, SPOTS};

pub const REWARD_FRAGMENT: &str = "bingo";
pub const SHARE_FRAGMENT: &str = "share";

const STYLE: &str = r#"
body { font-family: sans-serif; background: #eff6ff; margin: 0; padding: 24px 16px; }
main { max-width: 42rem; margin: 0 auto; }
h1 { color: #2563eb; text-align: center; }
.panel { background: #fff; border-radius: 8px; padding: 24px; margin-bottom: 24px; }
.toolbar { display: flex; justify-content: space-between; align-items: center; }
.count { font-size: 1.5rem; font-weight: bold; color: #2563eb; }
.bar { background: #e5e7eb; border-radius: 999px; height: 12px; margin-top: 16px; }
.bar > div { background: linear-gradient(to right, #3b82f6, #1e3a8a); border-radius: 999px; height: 12px; }
.grid { display: grid; grid-template-columns: repeat(COLS, 1fr); gap: 8px; }
.grid form { margin: 0; }
.cell { width: 100%; aspect-ratio: 1; border-radius: 8px; font-size: 0.75rem; border: 1px solid #dbeafe; background: #fff; cursor: pointer; }
.cell.visited { background: linear-gradient(135deg, #3b82f6, #1e40af); color: #fff; }
.cell.free { display: flex; align-items: center; justify-content: center; cursor: default; }
.reward { font-family: monospace; font-size: 1.5rem; font-weight: bold; color: #1d4ed8; }
.modal { display: none; position: fixed; inset: 0; background: rgba(0,0,0,.6); align-items: center; justify-content: center; }
.modal:target { display: flex; }
.modal > div { background: #fff; border-radius: 16px; padding: 32px; max-width: 28rem; text-align: center; }
.confetti { position: fixed; top: 40px; left: 0; right: 0; text-align: center; font-size: 2.5rem; pointer-events: none; animation: celebrate DURATIONs forwards; }
@keyframes celebrate { 0%, 90% { opacity: 1; } 100% { opacity: 0; visibility: hidden; } }
"#;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// `/route` plus the current query, if any.
fn action_url(route: &str, controller: &BoardController) -> String {
    let query = controller.location().query.to_query_string();
    if query.is_empty() {
        route.to_string()
    } else {
        format!("{route}?{query}")
    }
}

fn style() -> String {
    STYLE
        .replace("COLS", &GRIDCONFIG.cols.to_string())
        .replace("DURATION", &CELEBRATION_DURATION.as_secs().to_string())
}

fn render_cell(out: &mut String, controller: &BoardController, index: usize) {
    let label = escape_html(SPOTS[index]);
    let visited = controller.state().is_visited(index);

    if index == FREE_CELL {
        let _ = write!(
            out,
            r#"<div class="cell free visited"><div><strong>FREE</strong><br>{label}</div></div>"#
        );
        return;
    }

    let class = if visited { "cell visited" } else { "cell" };
    let mark = if visited { "🏆<br>" } else { "" };
    let _ = write!(
        out,
        r#"<form method="post" action="{}"><button type="submit" class="{class}" aria-pressed="{visited}">{mark}{label}</button></form>"#,
        escape_html(&action_url(&format!("/visit/{index}"), controller)),
    );
}

/// Full page for the current location. `share_url` is what the share dialog
/// shows and copies.
pub fn render_board_page(controller: &BoardController, share_url: &Url) -> String {
    let mut out = String::new();
    let count = controller.visited_count();
    let progress = controller.progress_percent();

    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="ja">
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">
<title>東京観光ビンゴ</title><style>{}</style></head>
<body><main>
<h1>📍 東京観光ビンゴ</h1>
<p style="text-align:center">スポットを訪れてビンゴを揃えよう!</p>
<section class="panel">
<div class="toolbar">
<div><div class="count">{count}/{CELLCOUNT}</div><div>訪問済み</div></div>
<div><a href="{share_href}">共有</a> <a href="{reset_href}">リセット</a></div>
</div>
<div class="bar"><div style="width:{progress}%"></div></div>
<div style="text-align:right">{progress}%</div>
</section>
<section class="grid">"#,
        style(),
        share_href = escape_html(&format!("{}#{SHARE_FRAGMENT}", action_url("/", controller))),
        reset_href = escape_html(&action_url("/reset", controller)),
    );

    for index in 0..CELLCOUNT {
        render_cell(&mut out, controller, index);
    }
    out.push_str("</section>\n");

    if let Some(code) = controller.reward_code() {
        let code = escape_html(code.as_str());
        let _ = write!(
            out,
            r#"<section class="panel" style="margin-top:48px">
<h2>🎁 獲得クーポン</h2>
<div>ビンゴ達成クーポン</div>
<div class="reward">{code}</div>
<div>※店舗でこのコードを提示してください</div>
</section>
<div id="{REWARD_FRAGMENT}" class="modal"><div>
<div class="confetti">🎊</div>
<div style="font-size:3.75rem">🎉</div>
<h3>ビンゴ達成!</h3>
<p>クーポンをゲットしました!</p>
<div class="reward">{code}</div>
<p><a href="{close}">閉じる</a></p>
</div></div>
"#,
            close = escape_html(&format!("{}#", action_url("/", controller))),
        );
    }

    let share = escape_html(share_url.as_str());
    let _ = write!(
        out,
        r#"<div id="{SHARE_FRAGMENT}" class="modal"><div>
<h3>進捗を共有</h3>
<p>このURLで進捗状態を保存・共有できます</p>
<p id="share-url" style="word-break:break-all">{share}</p>
<p><button type="button" onclick="navigator.clipboard.writeText(document.getElementById('share-url').textContent).then(function(){{alert('URLをコピーしました!')}},function(){{alert('URLをコピーできませんでした')}})">URLをコピー</button></p>
<p><a href="{qr}" target="_blank" rel="noopener">QRコード生成</a></p>
<p><a href="{close}">閉じる</a></p>
</div></div>
</main></body></html>
"#,
        qr = escape_html(&action_url("/qr", controller)),
        close = escape_html(&format!("{}#", action_url("/", controller))),
    );

    out
}

/// The yes/no question that must be answered before a reset.
pub fn render_reset_confirmation(controller: &BoardController) -> String {
    let action = escape_html(&action_url("/reset", controller));
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head><meta charset="utf-8"><title>リセット</title><style>{}</style></head>
<body><main><section class="panel" style="text-align:center">
<p>{}</p>
<form method="post" action="{action}">
<button type="submit" name="confirm" value="yes">OK</button>
<button type="submit" name="confirm" value="no">キャンセル</button>
</form>
</section></main></body></html>
"#,
        style(),
        escape_html(RESET_PROMPT),
    )
}
