// What you SEE:
// • The mirrored webcam (press W to turn it on) with your painting on top.
// • Pinch thumb + index finger together to put the pen down; open to lift it.
// • C clears, Z undoes, Y redoes, 1-7 pick a color, [ ] change the width.
// • H hides the HUD. ESC quits.

use clap::Parser;
use pinch_paint::camera::{BlankVideo, CameraCapture, VideoSource};
use pinch_paint::config::Config;
use pinch_paint::detector::{KeypointSource, ReplayDetector, SubprocessDetector};
use pinch_paint::draw::Drawer;
use pinch_paint::driver::{Command, RenderLoop, apply_command};
use pinch_paint::{Error, Session};
use tracing::info;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinch_paint=info".into()),
        )
        .init();

    let config = Config::parse();
    info!(?config, "starting");

    // Everything runs on this one thread; detection and snapshot decoding are
    // awaited inside the frame loop.
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Error> {
    let session = Session::new(config.width, config.height, config.brush()?, config.history());
    let mut drawer = Drawer::new("Pinch Paint", config.width, config.height)?;

    match &config.replay {
        Some(path) => {
            let detector = ReplayDetector::load(path).await?;
            let video = BlankVideo::new(config.width, config.height);
            drive(&config, session, video, detector, &mut drawer).await
        }
        None => {
            let detector = SubprocessDetector::from_command_line(&config.detector_cmd).await?;
            let video = CameraCapture::new(config.camera_index, config.width as u32, config.height as u32);
            drive(&config, session, video, detector, &mut drawer).await
        }
    }
}

async fn drive<V: VideoSource, K: KeypointSource>(
    config: &Config,
    mut session: Session,
    mut video: V,
    mut detector: K,
    drawer: &mut Drawer,
) -> Result<(), Error> {
    if config.autostart {
        apply_command(Command::ToggleInput, &mut session, &mut video).await?;
    }
    RenderLoop::new(config.fps).run(&mut session, &mut video, &mut detector, drawer).await
}
