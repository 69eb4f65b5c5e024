use glance::{Glance, PresenterState, Size, SurfaceTarget, global_config, logging};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

const USAGE: &str = "usage: glance-demo <image> [width] [height] [output.png]";
const TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    logging::init(&global_config().log_level);

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };
    let width = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(256);
    let height = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(width);
    let output = args.next().map(PathBuf::from);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let glance = Glance::current();
    runtime.block_on(glance.run_until(run(&glance, path, Size::new(width, height), output)))
}

async fn run(glance: &Glance, path: PathBuf, size: Size, output: Option<PathBuf>) -> ExitCode {
    let target = Rc::new(SurfaceTarget::new(size));

    let attached = glance
        .load(path.clone())
        .and_then(|request| request.center_crop().into(&target));
    if let Err(err) = attached {
        eprintln!("Cannot load {}: {}", path.display(), err);
        return ExitCode::FAILURE;
    }

    match tokio::time::timeout(TIMEOUT, target.settled()).await {
        Ok(Some(PresenterState::Displayed)) => {}
        Ok(Some(PresenterState::Failed(message))) => {
            eprintln!("Failed to load {}: {}", path.display(), message);
            return ExitCode::FAILURE;
        }
        Ok(state) => {
            eprintln!("Load ended in unexpected state {:?}", state);
            return ExitCode::FAILURE;
        }
        Err(_) => {
            glance.cancel(&target);
            eprintln!("Timed out loading {}", path.display());
            return ExitCode::FAILURE;
        }
    }

    let Some(image) = target.image() else {
        eprintln!("Nothing displayed for {}", path.display());
        return ExitCode::FAILURE;
    };
    println!("{} -> {} ({})", path.display(), image.size(), image.source_id);

    if let Some(output) = output {
        if let Err(err) = image.pixels.save(&output) {
            eprintln!("Failed to write {}: {}", output.display(), err);
            return ExitCode::FAILURE;
        }
        println!("Wrote {}", output.display());
    }

    ExitCode::SUCCESS
}
