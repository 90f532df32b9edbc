#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("hopf_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::f64::consts::TAU;
    use std::fs;
    use std::path::{Path, PathBuf};

    use hopf_engine::geom::{CircleParams, HopfConfig, HopfScene, SamplingMode, with_obj_extension};

    const USAGE: &str = r#"hopf_cli (hopf-engine)

USAGE:
  hopf_cli list
  hopf_cli run <scenario|all> [options]

SCENARIOS:
  great_circle
  stacked_circles
  random
  loxodrome
  tubed_fiber

OPTIONS (run):
  --out-dir <dir>     Write <scenario>.obj (and <scenario>_tube.obj) to this dir (required for `all`)
  --obj <path>        Write fiber polylines (single scenario only; `.obj` appended if missing)
  --tube-obj <path>   Write the tube as triangle polylines (single scenario only)
  --fibers <n>        Override the number of fibers per circle
  --samples <n>       Override the number of samples per fiber
  --seed <n>          Override the seed of the `random` scenario
  --overwrite         Overwrite existing output files
  -h, --help          Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    #[derive(Debug, Default, Clone, Copy)]
    struct Overrides {
        fibers: Option<usize>,
        samples: Option<usize>,
        seed: Option<u64>,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut tube_obj_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut overrides = Overrides::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--tube-obj" => tube_obj_path = Some(PathBuf::from(args.value("--tube-obj")?)),
                "--fibers" => overrides.fibers = Some(args.parsed("--fibers")?),
                "--samples" => overrides.samples = Some(args.parsed("--samples")?),
                "--seed" => overrides.seed = Some(args.parsed("--seed")?),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || tube_obj_path.is_some() {
                return Err("use either --out-dir or --obj/--tube-obj (not both)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, overrides, dir, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, overrides, dir, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let scene = build_scene(scenario, overrides)?;

        if let Some(path) = obj_path.as_deref() {
            let written = write_fibers(&scene, path, overwrite)?;
            eprintln!("wrote {}", written.display());
        } else {
            print!("{}", scene.fibration_obj().map_err(|e| e.to_string())?);
        }

        if let Some(path) = tube_obj_path.as_deref() {
            let written = write_tube(&scene, path, overwrite)?;
            eprintln!("wrote {}", written.display());
        }

        report(scenario, &scene);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        overrides: Overrides,
        dir: &Path,
        overwrite: bool,
    ) -> Result<(), String> {
        let scene = build_scene(scenario, overrides)?;

        let written = write_fibers(&scene, &dir.join(format!("{}.obj", scenario.name())), overwrite)?;
        eprintln!("wrote {}", written.display());

        if scene.tube().is_some() {
            let path = dir.join(format!("{}_tube.obj", scenario.name()));
            let written = write_tube(&scene, &path, overwrite)?;
            eprintln!("wrote {}", written.display());
        }

        report(scenario, &scene);
        Ok(())
    }

    fn report(scenario: Scenario, scene: &HopfScene) {
        let fibration = scene.fibration();
        eprintln!(
            "{}: fibers={} samples={} | {}",
            scenario.name(),
            fibration.fiber_count(),
            fibration.iterations_per_fiber,
            scene.diagnostics().summary()
        );
    }

    fn build_scene(scenario: Scenario, overrides: Overrides) -> Result<HopfScene, String> {
        let mut config = scenario.config(overrides.seed);
        if let Some(fibers) = overrides.fibers {
            config.number_of_fibers = fibers;
        }
        if let Some(samples) = overrides.samples {
            config.iterations_per_fiber = samples;
        }
        HopfScene::new(config).map_err(|e| format!("{}: {e}", scenario.name()))
    }

    fn check_target(path: &Path, overwrite: bool) -> Result<PathBuf, String> {
        let path = with_obj_extension(path);
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(path)
    }

    fn write_fibers(scene: &HopfScene, path: &Path, overwrite: bool) -> Result<PathBuf, String> {
        scene
            .fibration_mesh()
            .validate()
            .map_err(|e| format!("mesh validation failed: {e}"))?;
        let path = check_target(path, overwrite)?;
        scene
            .export_fibration(&path)
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_tube(scene: &HopfScene, path: &Path, overwrite: bool) -> Result<PathBuf, String> {
        let path = check_target(path, overwrite)?;
        scene
            .export_tube(&path)
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            msg.push_str("  ");
            msg.push_str(scenario.name());
            msg.push('\n');
        }
        msg
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        GreatCircle,
        StackedCircles,
        Random,
        Loxodrome,
        TubedFiber,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::GreatCircle,
            Scenario::StackedCircles,
            Scenario::Random,
            Scenario::Loxodrome,
            Scenario::TubedFiber,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::GreatCircle => "great_circle",
                Scenario::StackedCircles => "stacked_circles",
                Scenario::Random => "random",
                Scenario::Loxodrome => "loxodrome",
                Scenario::TubedFiber => "tubed_fiber",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "great_circle" => Some(Scenario::GreatCircle),
                "stacked_circles" => Some(Scenario::StackedCircles),
                "random" => Some(Scenario::Random),
                "loxodrome" => Some(Scenario::Loxodrome),
                "tubed_fiber" => Some(Scenario::TubedFiber),
                _ => None,
            }
        }

        fn config(self, seed: Option<u64>) -> HopfConfig {
            let defaults = HopfConfig::default();
            match self {
                Scenario::GreatCircle => defaults,
                Scenario::StackedCircles => HopfConfig {
                    sampling: SamplingMode::GreatCircle {
                        circles: [-0.5, 0.0, 0.5]
                            .into_iter()
                            .map(|offset| CircleParams { offset, arc_angle: TAU })
                            .collect(),
                    },
                    number_of_fibers: 24,
                    ..defaults
                },
                Scenario::Random => HopfConfig {
                    sampling: SamplingMode::Random {
                        seed: seed.unwrap_or(1),
                        mean: 0.0,
                        std_dev: 1.0,
                    },
                    ..defaults
                },
                Scenario::Loxodrome => HopfConfig {
                    sampling: SamplingMode::Loxodrome { offset: 8.0 },
                    rotation: [30.0, 0.0, 0.0],
                    ..defaults
                },
                Scenario::TubedFiber => HopfConfig {
                    number_of_fibers: 12,
                    tube_fiber: Some(0),
                    ..defaults
                },
            }
        }
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }

        fn parsed<T: std::str::FromStr>(&mut self, flag: &str) -> Result<T, String>
        where
            T::Err: std::fmt::Display,
        {
            let raw = self.value(flag)?;
            raw.parse()
                .map_err(|e| format!("invalid value `{raw}` for {flag}: {e}"))
        }
    }
}
