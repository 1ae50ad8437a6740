use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_blokus::prelude::*;

/// Multi-threaded self-play playout driver: one shared root, one search
/// state per worker, biased-random playouts to the end of the game.
#[derive(Clone, Debug, Parser)]
struct DriverOptions {
    /// Game variant (duo, junior, classic, classic2, classic3, trigon,
    /// trigon2, trigon3).
    #[arg(short, long, default_value = "duo")]
    variant: Variant,

    /// Total number of simulations across all workers.
    #[arg(short, long, default_value_t = 10_000)]
    simulations: u64,

    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Evaluate symmetric playouts as draws from the copier's seat too.
    #[arg(long, default_value_t = false)]
    avoid_symmetric_draw: bool,

    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let options = DriverOptions::parse();
    let _logger = Logger::try_with_env_or_str(
        options.log_level.clone().unwrap_or("info".into()).as_str(),
    )?
    .write_mode(WriteMode::BufferAndFlush)
    .log_to_stderr()
    .adaptive_format_for_stderr(match cfg!(debug_assertions) {
        true => AdaptiveFormat::WithThread,
        _ => AdaptiveFormat::Default,
    })
    .start()?;

    let consts: &'static BoardConst = Box::leak(Box::new(BoardConst::new(options.variant)));
    let board = Board::new(consts);
    let shared = SharedConst::new(&board, Color(0), options.avoid_symmetric_draw);
    log::info!(
        "{}: {} pieces, {} moves, {} colors",
        options.variant,
        consts.nu_pieces(),
        consts.nu_moves(),
        options.variant.nu_colors()
    );

    let threads = options.threads.max(1);
    let per_worker = options.simulations.div_ceil(threads as u64);
    let start = std::time::Instant::now();
    let workers: Vec<WorkerSummary> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let shared = &shared;
                let seed = options.seed.wrapping_add(i as u64);
                scope.spawn(move || run_worker(shared, seed, per_worker))
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("worker panicked")).collect()
    });

    let elapsed = start.elapsed();
    let total: u64 = workers.iter().map(|w| w.simulations).sum::<u64>().max(1);
    let mut mean_result = [0.0f64; MAX_RESULTS];
    let mut mean_len = 0.0f64;
    for w in workers.iter().filter(|w| w.simulations > 0) {
        let share = w.simulations as f64 / total as f64;
        for (acc, v) in mean_result.iter_mut().zip(w.result_sum.iter()) {
            *acc += share * v / w.simulations as f64;
        }
        mean_len += share * w.length_sum / w.simulations as f64;
    }
    log::info!(
        "{} simulations in {:.2}s ({:.0}/s) over {} workers",
        total,
        elapsed.as_secs_f64(),
        total as f64 / elapsed.as_secs_f64(),
        threads
    );
    log::info!("mean playout length {:.1}", mean_len);
    for c in Color::all(options.variant.nu_colors()) {
        log::info!("color {}: mean result {:.3}", c.0, mean_result[c.index()]);
    }
    Ok(())
}

struct WorkerSummary {
    simulations: u64,
    result_sum: [f64; MAX_RESULTS],
    length_sum: f64,
}

fn run_worker(shared: &SharedConst<'_>, seed: u64, simulations: u64) -> WorkerSummary {
    let mut state = State::new(shared, seed);
    state.start_search();

    // Exercise the expansion path once per worker, as the tree would at
    // the root.
    let mut children = ChildBuffer::new(1 << 20);
    if state.gen_children(&mut children, 0.5) {
        log::debug!("root expands into {} children", children.children.len());
    }

    let mut summary = WorkerSummary {
        simulations,
        result_sum: [0.0; MAX_RESULTS],
        length_sum: 0.0,
    };
    for n in 0..simulations {
        state.start_simulation(n);
        while let Some(pm) = state.gen_playout_move() {
            state.play_playout(pm);
        }
        let result = state.evaluate_playout();
        for (acc, v) in summary.result_sum.iter_mut().zip(result.iter()) {
            *acc += *v as f64;
        }
        summary.length_sum += state.board().nu_moves() as f64;
    }
    log::debug!("worker done: {}", state.get_info());
    summary
}
