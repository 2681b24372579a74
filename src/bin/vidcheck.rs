//! vidcheck - 视频合规检查命令行

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use vidcheck_lib::api::{render_guidelines, VideoComplianceChecker, AUTHORIZATION_STATEMENT};
use vidcheck_lib::core::audio::{AudioChoice, MergeConfig};
use vidcheck_lib::core::{AnalysisConfig, AnalysisError, BucketEnumeration, GuidelineGroup};

#[derive(Parser, Debug)]
#[command(name = "vidcheck")]
#[command(version)]
#[command(about = "Check an MP4 against the car / smoke / grass / road guidelines")]
#[command(long_about = "Decodes every frame of the input video, evaluates the selected \
    guideline groups per frame and reports, second by second, which rules are violated \
    by majority vote.\n\n\
    EXAMPLES:\n    \
    vidcheck --acknowledge -i uploaded_video.mp4\n    \
    vidcheck --acknowledge -i uploaded_video.mp4 --primary --environmental --json\n    \
    vidcheck --acknowledge -i uploaded_video.mp4 --merge-audio 2 --assets-dir assets")]
struct Args {
    /// Input MP4 file
    #[arg(short, long, default_value = "uploaded_video.mp4")]
    input: PathBuf,

    /// Check the Primary Guidelines (rules 1-2)
    #[arg(long)]
    primary: bool,

    /// Check the Environmental Guidelines (rules 3-4)
    #[arg(long)]
    environmental: bool,

    /// Without --primary/--environmental, check no rule instead of the Primary Guidelines
    #[arg(long)]
    no_default_groups: bool,

    /// Only report seconds in which rule 1 was recorded
    #[arg(long)]
    legacy_buckets: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Acknowledge the authorization statement
    #[arg(long)]
    acknowledge: bool,

    /// Print the guidelines and exit
    #[arg(long)]
    guidelines: bool,

    /// Replace the soundtrack after the report (1, 2 or 3)
    #[arg(long, value_name = "CHOICE", value_parser = parse_choice)]
    merge_audio: Option<AudioChoice>,

    /// Directory holding audio1.mp3 .. audio3.mp3
    #[arg(long, default_value = ".")]
    assets_dir: PathBuf,

    /// Merged output file
    #[arg(short, long, default_value = "merged_video.mp4")]
    output: PathBuf,
}

fn parse_choice(s: &str) -> Result<AudioChoice, String> {
    s.parse().map_err(|e: vidcheck_lib::core::audio::AudioError| e.to_string())
}

impl Args {
    fn groups(&self) -> Vec<GuidelineGroup> {
        let mut groups = Vec::new();
        if self.primary {
            groups.push(GuidelineGroup::Primary);
        }
        if self.environmental {
            groups.push(GuidelineGroup::Environmental);
        }
        if groups.is_empty() && !self.no_default_groups {
            groups.push(GuidelineGroup::Primary);
        }
        groups
    }

    fn analysis_config(&self) -> AnalysisConfig {
        let mode = if self.legacy_buckets {
            BucketEnumeration::PrimaryRuleOnly
        } else {
            BucketEnumeration::ActiveRules
        };
        let mut config = AnalysisConfig::default()
            .with_video(&self.input)
            .with_groups(self.groups())
            .with_bucket_enumeration(mode);
        if let Some(choice) = self.merge_audio {
            config = config.with_audio(choice);
        }
        config
    }

    fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            assets_dir: self.assets_dir.clone(),
            output_path: self.output.clone(),
            ..Default::default()
        }
    }
}

fn run(args: &Args) -> Result<(), AnalysisError> {
    let checker = VideoComplianceChecker::create(args.analysis_config(), args.merge_config(), args.acknowledge)?;

    let report = checker.analyze()?;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    if let Some(choice) = checker.config().audio_choice {
        let merged = checker.merge_audio(choice)?;
        info!("🎵 {} merged into {}", choice, merged.display());
        if !args.json {
            println!("Merged video saved to {}", merged.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    vidcheck_lib::init_logging();
    let args = Args::parse();

    if args.guidelines {
        print!("{}", render_guidelines());
        return ExitCode::SUCCESS;
    }

    if !args.acknowledge {
        eprintln!("{}", AUTHORIZATION_STATEMENT);
        eprintln!("Re-run with --acknowledge to accept the statement above.");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
