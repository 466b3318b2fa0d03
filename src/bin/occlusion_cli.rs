#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("occlusion_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use ghx_occlusion::geom::{GeomMesh, GeomMeshDiagnostics, MeshFace, Point3};
    use ghx_occlusion::shadow::{
        ShadowVolume, ShadowVolumeInput, ShadowVolumeOptions, compute_shadow_volume,
    };
    use serde::Deserialize;
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"occlusion_cli (ghx-occlusion)

USAGE:
  occlusion_cli list
  occlusion_cli run <scenario|all> [options]

SCENARIOS:
  twin_lights_window
  crossed_slots
  short_wall

OPTIONS (run):
  --input <path>     Read a JSON request { "input": ..., "options": ... } instead of a
                     built-in scenario; <scenario> then only names the outputs
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    /// Request file layout; `options` may be omitted.
    #[derive(Debug, Deserialize)]
    struct Request {
        input: ShadowVolumeInput,
        #[serde(default)]
        options: ShadowVolumeOptions,
    }

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

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut input_path: Option<PathBuf> = None;
        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input" => input_path = Some(PathBuf::from(args.value("--input")?)),
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if scenario_name == "all" && input_path.is_some() {
            return Err("--input cannot be combined with `run all`".to_string());
        }

        let outputs = Outputs {
            write_obj,
            write_snap,
            overwrite,
        };

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    let output = run_scenario(*scenario)?;
                    write_outputs_to_dir(&output, dir, outputs)?;
                }
                return Ok(());
            }

            let output = load_and_run(&scenario_name, input_path.as_deref())?;
            return write_outputs_to_dir(&output, dir, outputs);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let output = load_and_run(&scenario_name, input_path.as_deref())?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.volume, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    #[derive(Debug, Clone, Copy)]
    struct Outputs {
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    }

    fn write_outputs_to_dir(output: &ScenarioOutput, dir: &Path, outputs: Outputs) -> Result<(), String> {
        if outputs.write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if outputs.write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.volume, outputs.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        let diag = &output.volume.diagnostics;
        eprintln!(
            "{}: samples={} survivors={} rejected1={} rejected2={} missing_wall={} wall_faces_dropped={}",
            output.name,
            diag.sample_count,
            diag.survivor_count,
            diag.rejected_by_boundary1,
            diag.rejected_by_boundary2,
            diag.missing_wall_hits,
            diag.wall_faces_dropped
        );
        if let Some(timing) = diag.timing.as_ref() {
            eprintln!("{}: {:.3} ms", output.name, timing.total_ms());
        }
    }

    fn load_and_run(name: &str, input_path: Option<&Path>) -> Result<ScenarioOutput, String> {
        let Some(path) = input_path else {
            let scenario = Scenario::from_str(name).ok_or_else(|| unknown_scenario(name))?;
            return run_scenario(scenario);
        };

        let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let request: Request =
            serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))?;
        solve(name.to_string(), &request.input, &request.options)
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        ensure_writable(path, overwrite)?;
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn ensure_writable(path: &Path, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(())
    }

    /// One object per cube, then the wall points as a point element group.
    fn write_obj_file(path: &Path, volume: &ShadowVolume, overwrite: bool) -> Result<(), String> {
        ensure_writable(path, overwrite)?;

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        write_obj(&mut w, volume).map_err(|e| format!("write obj: {e}"))?;
        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn write_obj(w: &mut impl Write, volume: &ShadowVolume) -> std::io::Result<()> {
        writeln!(w, "# ghx-occlusion occlusion_cli")?;

        // OBJ indices are global and 1-based.
        let mut base = 1u32;
        for (idx, cube) in volume.cubes.iter().enumerate() {
            writeln!(w, "o cube_{idx}")?;
            for p in &cube.positions {
                writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
            }
            for face in &cube.faces {
                write!(w, "f")?;
                for index in face.indices() {
                    write!(w, " {}", base + index)?;
                }
                writeln!(w)?;
            }
            base += cube.vertex_count() as u32;
        }

        if !volume.wall_points.is_empty() {
            writeln!(w, "o shadow_points")?;
            for p in &volume.wall_points {
                writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
            }
            for offset in 0..volume.wall_points.len() as u32 {
                writeln!(w, "p {}", base + offset)?;
            }
        }
        Ok(())
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_point_line(out: &mut String, prefix: &str, p: Point3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, p.x);
        out.push(' ');
        write_f64(out, p.y);
        out.push(' ');
        write_f64(out, p.z);
        out.push('\n');
    }

    fn snapshot(name: &str, volume: &ShadowVolume) -> String {
        let diag = &volume.diagnostics;
        let mut out = String::new();
        let _ = writeln!(out, "scenario {name}");
        let _ = writeln!(out, "diag.sample_count {}", diag.sample_count);
        let _ = writeln!(out, "diag.rejected_by_boundary1 {}", diag.rejected_by_boundary1);
        let _ = writeln!(out, "diag.rejected_by_boundary2 {}", diag.rejected_by_boundary2);
        let _ = writeln!(out, "diag.missing_wall_hits {}", diag.missing_wall_hits);
        let _ = writeln!(out, "diag.wall_faces_dropped {}", diag.wall_faces_dropped);
        let _ = writeln!(out, "diag.survivor_count {}", diag.survivor_count);

        if let Some(cube) = volume.cubes.first() {
            let _ = writeln!(out, "cube_diag {}", GeomMeshDiagnostics::from_mesh(cube).summary());
        }

        for (idx, p) in volume.points.iter().enumerate() {
            write_point_line(&mut out, &format!("survivor.{idx}"), *p);
            write_point_line(&mut out, &format!("wall.{idx}.1"), volume.wall_points[2 * idx]);
            write_point_line(&mut out, &format!("wall.{idx}.2"), volume.wall_points[2 * idx + 1]);
        }
        out
    }

    #[derive(Debug, Clone, Copy)]
    enum Scenario {
        TwinLightsWindow,
        CrossedSlots,
        ShortWall,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::TwinLightsWindow,
            Scenario::CrossedSlots,
            Scenario::ShortWall,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::TwinLightsWindow => "twin_lights_window",
                Scenario::CrossedSlots => "crossed_slots",
                Scenario::ShortWall => "short_wall",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "twin_lights_window" => Some(Scenario::TwinLightsWindow),
                "crossed_slots" => Some(Scenario::CrossedSlots),
                "short_wall" => Some(Scenario::ShortWall),
                _ => None,
            }
        }
    }

    struct ScenarioOutput {
        name: String,
        volume: ShadowVolume,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let input = match scenario {
            Scenario::TwinLightsWindow => scenario_twin_lights_window(),
            Scenario::CrossedSlots => scenario_crossed_slots(),
            Scenario::ShortWall => scenario_short_wall(),
        };
        solve(scenario.name().to_string(), &input, &ShadowVolumeOptions::default())
    }

    fn solve(
        name: String,
        input: &ShadowVolumeInput,
        options: &ShadowVolumeOptions,
    ) -> Result<ScenarioOutput, String> {
        let volume = compute_shadow_volume(input, options).map_err(|e| format!("{name}: {e}"))?;
        let snapshot = snapshot(&name, &volume);
        Ok(ScenarioOutput {
            name,
            volume,
            snapshot,
        })
    }

    /// Axis-aligned rectangle at height `z`, counter-clockwise seen from above.
    fn rectangle(min: [f64; 2], max: [f64; 2], z: f64) -> Vec<Point3> {
        vec![
            Point3::new(min[0], min[1], z),
            Point3::new(max[0], min[1], z),
            Point3::new(max[0], max[1], z),
            Point3::new(min[0], max[1], z),
        ]
    }

    fn floor(min: [f64; 2], max: [f64; 2], z: f64) -> GeomMesh {
        let positions = rectangle(min, max, z).into_iter().map(Point3::to_array).collect();
        GeomMesh::new(positions, vec![MeshFace::Quad([0, 1, 2, 3])])
    }

    fn scenario_twin_lights_window() -> ShadowVolumeInput {
        ShadowVolumeInput {
            light1: Point3::new(-2.0, 0.0, 10.0),
            boundary1: rectangle([-2.0, -2.0], [2.0, 2.0], 5.0),
            light2: Point3::new(2.0, 0.0, 10.0),
            boundary2: rectangle([-2.0, -2.0], [2.0, 2.0], 5.0),
            corner_a: Point3::new(-3.0, -3.0, 0.0),
            corner_b: Point3::new(3.0, 3.0, 2.0),
            wall: floor([-20.0, -20.0], [20.0, 20.0], -1.0),
            x_count: 7,
            y_count: 7,
            z_count: 3,
        }
    }

    fn scenario_crossed_slots() -> ShadowVolumeInput {
        ShadowVolumeInput {
            light1: Point3::new(0.0, -4.0, 8.0),
            boundary1: rectangle([-4.0, -0.5], [4.0, 0.5], 4.0),
            light2: Point3::new(0.0, 4.0, 8.0),
            boundary2: rectangle([-0.5, -4.0], [0.5, 4.0], 4.0),
            corner_a: Point3::new(-2.0, -2.0, 0.0),
            corner_b: Point3::new(2.0, 2.0, 1.0),
            wall: floor([-30.0, -30.0], [30.0, 30.0], -0.5),
            x_count: 9,
            y_count: 9,
            z_count: 2,
        }
    }

    fn scenario_short_wall() -> ShadowVolumeInput {
        ShadowVolumeInput {
            light1: Point3::new(-1.0, 0.0, 6.0),
            boundary1: rectangle([-3.0, -3.0], [3.0, 3.0], 3.0),
            light2: Point3::new(1.0, 0.0, 6.0),
            boundary2: rectangle([-3.0, -3.0], [3.0, 3.0], 3.0),
            corner_a: Point3::new(-2.0, -1.0, 0.0),
            corner_b: Point3::new(2.0, 1.0, 1.0),
            // Covers only x >= 0, so samples on the left lose their wall hits.
            wall: floor([0.0, -10.0], [10.0, 10.0], -1.0),
            x_count: 5,
            y_count: 3,
            z_count: 2,
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
    }
}
