use super::CliError;
use super::helpers::{RunContext, compute, print_artifacts, require_positive};
use fluidpost_core::domain::AnalysisKind;
use fluidpost_core::launch::{
    AbsoluteLadder, JobSpec, LaunchPlan, Scheduler, SoftSphereJob, SoftSphereRunner,
    WcaRadialJob,
};
use fluidpost_core::modules::AnalysisExecutor;
use fluidpost_core::modules::coexistence::CoexistenceAnalysis;
use fluidpost_core::modules::comparison::ComparisonAnalysis;
use fluidpost_core::modules::contact::{ContactAnalysis, ContactGeometry};
use fluidpost_core::modules::free_energy::FreeEnergyAnalysis;
use fluidpost_core::modules::heat_capacity::{
    DEFAULT_ATOMS, DEFAULT_MIN_TIME, DEFAULT_SAVE_TIME, HeatCapacityAnalysis,
};
use fluidpost_core::modules::histogram::{HistogramAnalysis, HistogramPlot, SquareWellSystem};
use fluidpost_core::modules::pair_correlation::PairCorrelationAnalysis;
use fluidpost_core::modules::scaling::ScalingAnalysis;
use fluidpost_core::modules::soft_sphere::{SoftSphereAnalysis, SoftSpherePlot};
use fluidpost_core::modules::thermodynamics::ThermodynamicsAnalysis;
use fluidpost_core::numerics::DEFAULT_MIN_T_THRESHOLD;
use std::path::PathBuf;

fn run_analysis<A: AnalysisExecutor>(
    context: &RunContext,
    label: &str,
    kind: AnalysisKind,
    analysis: &A,
) -> Result<i32, CliError> {
    let request = context.request(label, kind);
    let artifacts = compute(analysis.execute(&request))?;
    print_artifacts(&request, &artifacts);
    Ok(0)
}

#[derive(clap::Subcommand)]
pub(super) enum ContactCommand {
    /// Hard-sphere solute immersed in the fluid
    Inner(SphereArgs),
    /// Fluid confined in a spherical cavity
    Outer(SphereArgs),
    /// Fluid between two hard walls
    Walls(WallArgs),
}

#[derive(clap::Args)]
pub(super) struct SphereArgs {
    /// Sphere radius in units of the particle radius
    #[arg(long)]
    radius: f64,

    /// Filling-fraction digit (3 for 0.3)
    #[arg(long = "ff", value_parser = clap::value_parser!(u32).range(1..10))]
    ff_digit: u32,
}

#[derive(clap::Args)]
pub(super) struct WallArgs {
    /// Monte Carlo density profile
    #[arg(long)]
    mc: PathBuf,

    /// White Bear DFT profile
    #[arg(long)]
    white_bear: PathBuf,

    /// Tensorial White Bear DFT profile
    #[arg(long)]
    white_bear_tensorial: PathBuf,

    /// White Bear mark II DFT profile
    #[arg(long)]
    mark_two: PathBuf,
}

pub(super) fn run_contact_command(
    context: &RunContext,
    command: ContactCommand,
) -> Result<i32, CliError> {
    let geometry = match command {
        ContactCommand::Inner(args) => ContactGeometry::InnerSphere {
            radius: args.radius,
            ff_digit: args.ff_digit,
        },
        ContactCommand::Outer(args) => ContactGeometry::OuterSphere {
            radius: args.radius,
            ff_digit: args.ff_digit,
        },
        ContactCommand::Walls(args) => ContactGeometry::Walls {
            mc: args.mc,
            white_bear: args.white_bear,
            white_bear_tensorial: args.white_bear_tensorial,
            mark_two: args.mark_two,
        },
    };
    let mut analysis = ContactAnalysis::new(geometry);
    analysis.figure_size = context.figure_size;
    run_analysis(context, "contact", AnalysisKind::Contact, &analysis)
}

#[derive(clap::Args)]
pub(super) struct GhsArgs {
    /// Prefix of the `<base>-<ff>.dat` radial distribution files
    #[arg(long, default_value = "gr")]
    file_base: String,

    /// Filling fractions to load, comma separated
    #[arg(long, value_delimiter = ',')]
    filling_fractions: Vec<f64>,

    /// Five model parameters, comma separated
    #[arg(long, value_delimiter = ',')]
    parameters: Vec<f64>,

    /// Fit the parameters by least squares before writing
    #[arg(long)]
    fit: bool,
}

pub(super) fn run_ghs_command(context: &RunContext, args: GhsArgs) -> Result<i32, CliError> {
    let mut analysis = PairCorrelationAnalysis {
        file_base: args.file_base,
        fit: args.fit,
        figure_size: context.figure_size,
        ..PairCorrelationAnalysis::default()
    };
    if !args.filling_fractions.is_empty() {
        analysis.filling_fractions = args.filling_fractions;
    }
    if !args.parameters.is_empty() {
        let expected = analysis.parameters.len();
        analysis.parameters = args.parameters.as_slice().try_into().map_err(|_| {
            CliError::Usage(format!(
                "Expected {expected} values for '--parameters', got {}.",
                args.parameters.len()
            ))
        })?;
    }
    run_analysis(context, "ghs", AnalysisKind::PairCorrelation, &analysis)
}

#[derive(clap::Args)]
pub(super) struct SystemArgs {
    /// Well width lambda
    #[arg(long = "ww")]
    well_width: f64,

    /// Filling fraction eta
    #[arg(long = "ff")]
    filling_fraction: f64,

    /// Number of particles
    #[arg(short = 'N', long = "particles")]
    particles: usize,

    /// Simulation methods, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    methods: Vec<String>,
}

impl SystemArgs {
    fn system(&self) -> Result<SquareWellSystem, CliError> {
        Ok(SquareWellSystem::new(
            self.well_width,
            self.filling_fraction,
            require_positive(self.particles, "--particles")?,
        ))
    }
}

#[derive(clap::Args)]
pub(super) struct DosArgs {
    #[command(flatten)]
    system: SystemArgs,

    /// Random seed directory `s<seed>`
    #[arg(long, default_value_t = 0)]
    seed: u32,
}

pub(super) fn run_histogram_command(
    context: &RunContext,
    plot: HistogramPlot,
    args: SystemArgs,
) -> Result<i32, CliError> {
    let mut analysis = HistogramAnalysis::new(plot, args.system()?, args.methods);
    analysis.figure_size = context.figure_size;
    let label = match plot {
        HistogramPlot::EnergyHistogram => "histogram",
        HistogramPlot::DensityOfStates { .. } => "dos",
        HistogramPlot::SampleRate => "samples",
    };
    run_analysis(context, label, plot.kind(), &analysis)
}

pub(super) fn run_dos_command(context: &RunContext, args: DosArgs) -> Result<i32, CliError> {
    run_histogram_command(
        context,
        HistogramPlot::DensityOfStates { seed: args.seed },
        args.system,
    )
}

#[derive(clap::Args)]
pub(super) struct ScalingArgs {
    /// Well width lambda
    #[arg(long = "ww")]
    well_width: f64,

    /// Filling fraction eta
    #[arg(long = "ff")]
    filling_fraction: f64,

    /// Particle counts for the table and error scaling, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    sizes: Vec<usize>,

    /// Simulation methods, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    methods: Vec<String>,
}

pub(super) fn run_scaling_command(
    context: &RunContext,
    args: ScalingArgs,
) -> Result<i32, CliError> {
    let mut analysis = ScalingAnalysis::new(
        args.well_width,
        args.filling_fraction,
        args.sizes,
        args.methods,
    );
    analysis.figure_size = context.figure_size;
    run_analysis(context, "scaling", AnalysisKind::Scaling, &analysis)
}

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    /// Energy state whose error is tracked
    #[arg(long, allow_hyphen_values = true)]
    energy: i64,

    /// Converged reference density of states, relative to the data root
    #[arg(long)]
    reference: PathBuf,

    /// Prefix of the `<base>-<method>-movie` directories
    #[arg(long)]
    file_base: String,

    /// Methods to compare, comma separated; default discovers every movie
    #[arg(long, value_delimiter = ',')]
    methods: Vec<String>,

    /// Running-mean window applied to the maximum error
    #[arg(long)]
    running_mean: Option<usize>,
}

pub(super) fn run_compare_command(
    context: &RunContext,
    args: CompareArgs,
) -> Result<i32, CliError> {
    let mut analysis = ComparisonAnalysis::new(args.energy, args.reference, args.file_base);
    analysis.methods = args.methods;
    analysis.running_mean_window = args.running_mean;
    analysis.figure_size = context.figure_size;
    run_analysis(context, "compare", AnalysisKind::DosComparison, &analysis)
}

#[derive(clap::Args)]
pub(super) struct HeatCapacityArgs {
    /// Run bases relative to the data root, benchmark first, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    runs: Vec<PathBuf>,

    /// Atoms in the cluster
    #[arg(long, default_value_t = DEFAULT_ATOMS)]
    atoms: usize,

    /// Earliest saved time that is scored
    #[arg(long, default_value_t = DEFAULT_MIN_TIME)]
    min_time: f64,

    /// Saved time whose heat capacity is written out
    #[arg(long, default_value_t = DEFAULT_SAVE_TIME)]
    save_time: f64,
}

pub(super) fn run_heat_capacity_command(
    context: &RunContext,
    args: HeatCapacityArgs,
) -> Result<i32, CliError> {
    let mut analysis = HeatCapacityAnalysis::new(args.runs);
    analysis.atoms = require_positive(args.atoms, "--atoms")?;
    analysis.min_time = args.min_time;
    analysis.save_time = args.save_time;
    analysis.figure_size = context.figure_size;
    run_analysis(context, "lj-heat-capacity", AnalysisKind::HeatCapacity, &analysis)
}

#[derive(clap::Args)]
pub(super) struct ThermoArgs {
    #[command(flatten)]
    system: SystemArgs,

    /// Fraction of the ground-state probability that marks min_T
    #[arg(long, default_value_t = DEFAULT_MIN_T_THRESHOLD)]
    min_t_threshold: f64,
}

pub(super) fn run_thermo_command(context: &RunContext, args: ThermoArgs) -> Result<i32, CliError> {
    let mut analysis = ThermodynamicsAnalysis::new(args.system.system()?, args.system.methods);
    if let Some(range) = context.temperatures {
        analysis.temperatures = range.grid();
    }
    analysis.min_t_threshold = args.min_t_threshold;
    analysis.figure_size = context.figure_size;
    run_analysis(context, "thermo", AnalysisKind::Thermodynamics, &analysis)
}

#[derive(clap::Args)]
pub(super) struct FreeEnergyArgs {
    /// Well width lambda
    #[arg(long = "ww", default_value_t = 1.3)]
    well_width: f64,

    /// Temperatures kT, comma separated; default 1 through 10
    #[arg(long, value_delimiter = ',')]
    temperatures: Vec<f64>,
}

pub(super) fn run_free_energy_command(
    context: &RunContext,
    args: FreeEnergyArgs,
) -> Result<i32, CliError> {
    let mut analysis = FreeEnergyAnalysis {
        well_width: args.well_width,
        figure_size: context.figure_size,
        ..FreeEnergyAnalysis::default()
    };
    if !args.temperatures.is_empty() {
        analysis.temperatures = args.temperatures;
    }
    run_analysis(context, "free-energy", AnalysisKind::FreeEnergy, &analysis)
}

pub(super) fn run_coexistence_command(context: &RunContext) -> Result<i32, CliError> {
    let analysis = CoexistenceAnalysis {
        figure_size: context.figure_size,
    };
    run_analysis(context, "coexistence", AnalysisKind::Coexistence, &analysis)
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum SoftPlotArg {
    Pressure,
    EnergyPdf,
    Diffusion,
    Radial,
}

impl From<SoftPlotArg> for SoftSpherePlot {
    fn from(value: SoftPlotArg) -> Self {
        match value {
            SoftPlotArg::Pressure => Self::Pressure,
            SoftPlotArg::EnergyPdf => Self::EnergyPdf,
            SoftPlotArg::Diffusion => Self::Diffusion,
            SoftPlotArg::Radial => Self::Radial,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct SoftArgs {
    /// Plots to produce, comma separated; default all
    #[arg(long, value_enum, value_delimiter = ',')]
    plots: Vec<SoftPlotArg>,

    /// Density grid as `min,max,step` (max excluded)
    #[arg(long, value_delimiter = ',')]
    densities: Vec<f64>,

    /// Temperature grid as `min,max,step` (max excluded)
    #[arg(long, value_delimiter = ',')]
    temperatures: Vec<f64>,
}

fn grid_flag(values: &[f64], flag: &str) -> Result<Option<[f64; 3]>, CliError> {
    match values {
        [] => Ok(None),
        &[min, max, step] => Ok(Some([min, max, step])),
        _ => Err(CliError::Usage(format!(
            "Expected 'min,max,step' for '{flag}', got {} values.",
            values.len()
        ))),
    }
}

pub(super) fn run_soft_command(context: &RunContext, args: SoftArgs) -> Result<i32, CliError> {
    let mut analysis = if args.plots.is_empty() {
        SoftSphereAnalysis::default()
    } else {
        SoftSphereAnalysis::new(args.plots.into_iter().map(SoftSpherePlot::from).collect())
    };
    if let Some([min, max, step]) = grid_flag(&args.densities, "--densities")? {
        analysis.grid.density_min = min;
        analysis.grid.density_max = max;
        analysis.grid.density_step = step;
    }
    if let Some([min, max, step]) = grid_flag(&args.temperatures, "--temperatures")? {
        analysis.grid.temperature_min = min;
        analysis.grid.temperature_max = max;
        analysis.grid.temperature_step = step;
    }
    analysis.figure_size = context.figure_size;
    run_analysis(context, "soft", AnalysisKind::SoftSphere, &analysis)
}

#[derive(clap::Args)]
pub(super) struct LaunchFlags {
    /// Submit through `srun` with this memory limit in MB
    #[arg(long)]
    srun_mem: Option<u32>,

    /// Print the shell lines instead of starting the jobs
    #[arg(long)]
    dry_run: bool,
}

impl LaunchFlags {
    fn scheduler(&self) -> Scheduler {
        match self.srun_mem {
            Some(mem_mb) => Scheduler::Srun { mem_mb },
            None => Scheduler::Local,
        }
    }
}

#[derive(clap::Subcommand)]
pub(super) enum LaunchCommand {
    /// Absolute free-energy ladder for scrunched square-well systems
    Absolute(AbsoluteArgs),
    /// Soft-sphere Monte Carlo run
    Soft(SoftLaunchArgs),
    /// WCA radial distribution run
    Wca(WcaArgs),
}

#[derive(clap::Args)]
pub(super) struct AbsoluteArgs {
    /// Renormalisation recursion level
    #[arg(long, default_value_t = 0)]
    recursion: u32,

    /// Well width lambda
    #[arg(long = "ww")]
    well_width: f64,

    /// Box side length
    #[arg(long)]
    length: f64,

    /// Particle counts, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    sizes: Vec<usize>,

    /// Free-energy Monte Carlo executable
    #[arg(long, default_value = "free-energy-monte-carlo")]
    program: PathBuf,

    /// Rerun steps whose `.dat` output already exists
    #[arg(short = 'O', long)]
    overwrite: bool,

    #[command(flatten)]
    launch: LaunchFlags,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum SoftLaunchKind {
    Homogeneous,
    Walls,
    TestParticle,
    Fcc,
}

#[derive(clap::Args)]
pub(super) struct SoftLaunchArgs {
    #[arg(long, value_enum, default_value = "homogeneous")]
    kind: SoftLaunchKind,

    /// Reduced density
    #[arg(long)]
    density: f64,

    /// Reduced temperature
    #[arg(long)]
    temperature: f64,

    /// Pair potential name passed through to the program
    #[arg(long, default_value = "")]
    potential: String,

    /// Sphere count for wall runs; 0 derives it from the density
    #[arg(long, default_value_t = 0)]
    spheres: u64,

    /// Test-particle diameter
    #[arg(long, default_value_t = 1.0)]
    sigma: f64,

    /// Test-particle well depth
    #[arg(long, default_value_t = 1.0)]
    epsilon: f64,

    /// Soft-sphere Monte Carlo executable
    #[arg(long, default_value = "soft-monte-carlo")]
    program: PathBuf,

    /// Directory receiving data and logs
    #[arg(long, default_value = "figs")]
    figs_dir: PathBuf,

    #[command(flatten)]
    launch: LaunchFlags,
}

#[derive(clap::Args)]
pub(super) struct WcaArgs {
    /// Reduced density
    #[arg(long)]
    density: f64,

    /// Reduced temperature
    #[arg(long)]
    temperature: f64,

    /// Directory holding `radial-wca.mkdat`
    #[arg(long, default_value = "figs")]
    figs_dir: PathBuf,

    /// Directory receiving the job log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    #[command(flatten)]
    launch: LaunchFlags,
}

fn launch(plan: LaunchPlan, dry_run: bool) -> Result<i32, CliError> {
    if dry_run {
        for line in plan.shell_lines() {
            println!("{line}");
        }
        return Ok(0);
    }
    let pids = compute(plan.execute())?;
    for (job, pid) in plan.jobs.iter().zip(pids) {
        println!("{} {} {}", pid, job.name, job.stdout_path.display());
    }
    Ok(0)
}

pub(super) fn run_launch_command(
    context: &RunContext,
    command: LaunchCommand,
) -> Result<i32, CliError> {
    match command {
        LaunchCommand::Absolute(args) => {
            let mut ladder = AbsoluteLadder::new(
                args.recursion,
                args.well_width,
                args.length,
                args.sizes,
                args.program,
            );
            ladder.overwrite = args.overwrite;
            let jobs = ladder.jobs(&context.data_root);
            launch(
                LaunchPlan::new(args.launch.scheduler(), jobs),
                args.launch.dry_run,
            )
        }
        LaunchCommand::Soft(args) => {
            let runner = SoftSphereRunner::new(args.program, args.figs_dir);
            let job = match args.kind {
                SoftLaunchKind::Homogeneous => SoftSphereJob::Homogeneous {
                    n_reduced: args.density,
                    temperature: args.temperature,
                    potential: args.potential,
                },
                SoftLaunchKind::Walls => SoftSphereJob::Walls {
                    n_reduced: args.density,
                    temperature: args.temperature,
                    spheres: args.spheres,
                },
                SoftLaunchKind::TestParticle => SoftSphereJob::TestParticle {
                    n_reduced: args.density,
                    temperature: args.temperature,
                    sigma: args.sigma,
                    epsilon: args.epsilon,
                    potential: args.potential,
                },
                SoftLaunchKind::Fcc => SoftSphereJob::Fcc {
                    n_reduced: args.density,
                    temperature: args.temperature,
                    potential: args.potential,
                },
            };
            let jobs: Vec<JobSpec> = vec![runner.plan(&job)];
            launch(
                LaunchPlan::new(args.launch.scheduler(), jobs),
                args.launch.dry_run,
            )
        }
        LaunchCommand::Wca(args) => {
            let job = WcaRadialJob {
                n_reduced: args.density,
                temperature: args.temperature,
            }
            .plan(&args.figs_dir, &args.log_dir);
            launch(
                LaunchPlan::new(args.launch.scheduler(), vec![job]),
                args.launch.dry_run,
            )
        }
    }
}
