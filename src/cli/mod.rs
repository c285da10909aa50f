// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to the
// application layer. Two commands:
//
//   1. `train`     — train FMLP on an atomic interaction dataset
//   2. `recommend` — top-K items for a history, from the best checkpoint
//
// The backend flag is resolved here into a concrete Burn backend.

pub mod commands;

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::Backend,
};
use clap::Parser;
use commands::{Commands, RecommendArgs, TrainArgs};

use crate::application::{
    recommend_use_case::RecommendUseCase,
    train_use_case::TrainUseCase,
    BackendKind,
};
use crate::domain::traits::Recommender;

#[derive(Parser, Debug)]
#[command(
    name = "fmlp-rec",
    version,
    about = "Train a filter-enhanced MLP sequential recommender, then rank items for a history."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. No computation happens here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Recommend(args) => run_recommend(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on dataset '{}' ({} backend)", args.dataset, args.backend);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!(
        "Training complete. Best epoch {} | test hit={:.4} ndcg={:.4} mrr={:.4}",
        report.best_epoch, report.test.hit, report.test.ndcg, report.test.mrr,
    );
    Ok(())
}

fn run_recommend(args: RecommendArgs) -> Result<()> {
    match args.backend {
        BackendKind::Ndarray => recommend_on::<NdArray>(&args, NdArrayDevice::default()),
        BackendKind::Wgpu    => recommend_on::<Wgpu>(&args, WgpuDevice::default()),
    }
}

fn recommend_on<B: Backend>(args: &RecommendArgs, device: B::Device) -> Result<()> {
    let use_case = RecommendUseCase::<B>::from_checkpoint(&args.checkpoint_dir, device)?;
    let items    = use_case.recommend(&args.history, args.top_k)?;

    println!("\nTop {} items:", items.len());
    for (rank, item) in items.iter().enumerate() {
        println!("{:>3}. {:<20} {:.4}", rank + 1, item.item, item.score);
    }
    Ok(())
}
