//! Local HTTP server for tests
//!
//! Serves a small mobile streaming site with the same markup hooks as the
//! real one (search icon, search input, `tw-link` suggestions, `<article>`
//! result cards, channel header and mature content gate), plus a `/lab` page
//! for exercising the interaction primitives in isolation.
//!
//! Each server instance runs on a random available port for perfect test isolation.

use std::net::SocketAddr;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::Filter;

/// A live channel listed in search results
#[allow(dead_code)]
pub struct Channel {
    pub title: &'static str,
    pub name: &'static str,
    pub game: &'static str,
    pub viewers: &'static str,
    pub mature: bool,
}

/// Result cards in page order. The last one sits behind the mature gate.
#[allow(dead_code)]
pub const CHANNELS: &[Channel] = &[
    Channel {
        title: "Ladder grind to GM",
        name: "velocitish",
        game: "StarCraft II",
        viewers: "2.1K viewers",
        mature: false,
    },
    Channel {
        title: "Co-op brutal+ with chat",
        name: "ZergLingo",
        game: "StarCraft II",
        viewers: "940 viewers",
        mature: false,
    },
    Channel {
        title: "Pro replays reviewed",
        name: "CasterCove",
        game: "StarCraft II",
        viewers: "811 viewers",
        mature: false,
    },
    Channel {
        title: "Arcade maps all night",
        name: "ProbeRush",
        game: "StarCraft II",
        viewers: "503 viewers",
        mature: false,
    },
    Channel {
        title: "Teaching macro from bronze",
        name: "SupplyBlocked",
        game: "StarCraft II",
        viewers: "420 viewers",
        mature: false,
    },
    Channel {
        title: "Late night customs",
        name: "NightOwlSC",
        game: "StarCraft II",
        viewers: "312 viewers",
        mature: true,
    },
];

// 1x1 transparent GIF so thumbnails have real image content
const PIXEL: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

const HOME_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Twitch</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { margin: 0; font-family: sans-serif; }
        header { display: flex; justify-content: space-between; padding: 12px; }
        #search-overlay { display: none; padding: 12px; }
        #search-overlay input { width: 90%; font-size: 18px; }
        #suggestions a { display: block; padding: 10px 0; }
    </style>
</head>
<body>
    <header>
        <span>Home</span>
        <a aria-label="Search" href="#" id="search-icon">Search</a>
    </header>
    <div id="search-overlay">
        <input type="search" placeholder="Search">
        <div id="suggestions"></div>
    </div>
    <main><h1>Live channels we think you'll like</h1></main>
    <script>
        const GAMES = ['StarCraft II', 'StarCraft', 'StarCraft: Remastered', 'Stardew Valley'];
        document.getElementById('search-icon').addEventListener('click', (event) => {
            event.preventDefault();
            document.getElementById('search-overlay').style.display = 'block';
        });
        const input = document.querySelector('input[type=search]');
        input.addEventListener('input', () => {
            const query = input.value.trim().toLowerCase();
            const box = document.getElementById('suggestions');
            box.innerHTML = '';
            if (!query) return;
            GAMES.filter((game) => game.toLowerCase().startsWith(query)).forEach((game) => {
                const link = document.createElement('a');
                link.className = 'tw-link';
                link.href = '/search?term=' + encodeURIComponent(game);
                link.textContent = game;
                box.appendChild(link);
            });
        });
    </script>
</body>
</html>"##;

const LAB_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Interaction Lab</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { margin: 0; font-family: sans-serif; }
        button { width: 200px; height: 40px; }
        .box { position: relative; height: 60px; }
        #overlay { position: absolute; top: 0; left: 0; width: 100%; height: 100%; background: rgba(0, 0, 0, 0.3); }
        #spacer { height: 3000px; }
    </style>
</head>
<body>
    <script>window.__clicks = { visible: 0, covered: 0, overlay: 0, hidden: 0 };</script>
    <button id="visible-btn" onclick="window.__clicks.visible++">Visible</button>
    <div class="box">
        <button id="covered-btn" onclick="window.__clicks.covered++">Covered</button>
        <div id="overlay" onclick="window.__clicks.overlay++"></div>
    </div>
    <button id="hidden-btn" style="display: none" onclick="window.__clicks.hidden++">Hidden</button>
    <input id="name" type="text" value="prefilled" data-role="name-field">
    <ul>
        <li class="item">Protoss</li>
        <li class="item">Terran</li>
        <li class="item" id="late-item" style="visibility: hidden">Zerg</li>
    </ul>
    <div id="delayed-slot"></div>
    <div id="spacer"></div>
    <div id="far">Bottom of the page</div>
    <script>
        setTimeout(() => {
            document.getElementById('late-item').style.visibility = 'visible';
            const late = document.createElement('div');
            late.id = 'delayed';
            late.textContent = 'Arrived late';
            document.getElementById('delayed-slot').appendChild(late);
        }, 1500);
    </script>
</body>
</html>"#;

fn results_html() -> String {
    let cards: String = CHANNELS
        .iter()
        .map(|c| {
            format!(
                r#"<article style="height: 320px; border-bottom: 1px solid #ccc">
        <a href="/channel/{name}" style="display: block; height: 100%; color: inherit">
            <img class="tw-image" src="{pixel}" alt="" style="display: block; width: 100%; height: 160px">
            <div>{title}</div>
            <div>{name}</div>
            <div>{game}</div>
            <div>LIVE</div>
            <div>{viewers}</div>
        </a>
    </article>"#,
                name = c.name,
                pixel = PIXEL,
                title = c.title,
                game = c.game,
                viewers = c.viewers,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Search - Twitch</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>body {{ margin: 0; font-family: sans-serif; }}</style>
</head>
<body>
    <h2>Live channels</h2>
    {cards}
</body>
</html>"#
    )
}

fn channel_html(channel: &Channel) -> String {
    let gate = if channel.mature {
        r#"<div id="gate" style="position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0, 0, 0, 0.92); display: flex; align-items: center; justify-content: center">
        <button data-a-target="content-classification-gate-overlay-start-watching-button"
                onclick="document.getElementById('gate').style.display = 'none'">Start Watching</button>
    </div>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>{name} - Twitch</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>body {{ margin: 0; font-family: sans-serif; }}</style>
</head>
<body>
    <div id="player" style="height: 240px; background: #000"></div>
    <div class="Layout-sc-1xcs6mc-0 kFwQBd">
        <p title="{name}">{name}</p>
        <p title="{game}">{game}</p>
    </div>
    <p>{title}</p>
    {gate}
</body>
</html>"#,
        name = channel.name,
        game = channel.game,
        title = channel.title,
        gate = gate,
    )
}

/// Test server that serves the fake streaming site
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a new test server on a random available port
    pub async fn start() -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let index = warp::path::end().map(|| warp::reply::html(HOME_HTML));

        let search = warp::path("search")
            .and(warp::path::end())
            .map(|| warp::reply::html(results_html()));

        let lab = warp::path("lab")
            .and(warp::path::end())
            .map(|| warp::reply::html(LAB_HTML));

        let channel = warp::path!("channel" / String).map(|name: String| {
            match CHANNELS.iter().find(|c| c.name == name) {
                Some(channel) => {
                    warp::reply::with_status(warp::reply::html(channel_html(channel)), StatusCode::OK)
                }
                None => warp::reply::with_status(
                    warp::reply::html(format!("no channel named {}", name)),
                    StatusCode::NOT_FOUND,
                ),
            }
        });

        let routes = index.or(search).or(lab).or(channel);

        // Bind to random port
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                shutdown_rx.await.ok();
            });

        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this server (e.g., "http://127.0.0.1:12345")
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Home page URL, with trailing slash like the public site
    #[allow(dead_code)]
    pub fn home_url(&self) -> String {
        format!("{}/", self.url())
    }

    #[allow(dead_code)]
    pub fn lab_url(&self) -> String {
        format!("{}/lab", self.url())
    }

    #[allow(dead_code)]
    pub fn channel_url(&self, name: &str) -> String {
        format!("{}/channel/{}", self.url(), name)
    }

    /// Get the socket address (for meta tests)
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready by making a test request
    pub async fn wait_ready(&self) -> anyhow::Result<()> {
        let url = self.url();
        let max_attempts = 10;

        for attempt in 1..=max_attempts {
            match reqwest::get(&url).await {
                Ok(response) if response.status().is_success() => {
                    println!("✅ Test server ready on: {}", url);
                    return Ok(());
                }
                Ok(response) => {
                    println!(
                        "⚠️ Attempt {}: Server returned status {}",
                        attempt,
                        response.status()
                    );
                }
                Err(e) => {
                    println!("⚠️ Attempt {}: Server not ready - {}", attempt, e);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            }
        }

        anyhow::bail!(
            "Server did not become ready after {} attempts",
            max_attempts
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Signal server to shutdown
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
