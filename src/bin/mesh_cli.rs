#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use ghx_surface_mesh::geom::{
        MeshBuildDiagnostics, MeshedSurface, PlaneSurface, Point3, SphereSurface, SurfaceMesh,
        TorusSurface, TwistedRibbon, Vec3,
    };
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;
    const DEFAULT_DS: f64 = 0.25;

    const USAGE: &str = r#"mesh_cli (ghx-surface-mesh)

USAGE:
  mesh_cli list
  mesh_cli run <scenario|all> [options]

SCENARIOS:
  twisted_ribbon
  sphere
  torus
  plane

OPTIONS (run):
  --ds <length>      Target maximum edge length (default 0.25)
  --out-dir <dir>    Write <scenario>.obj and <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
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

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut ds = DEFAULT_DS;
        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ds" => {
                    let raw = args.value("--ds")?;
                    ds = raw
                        .parse()
                        .map_err(|e| format!("invalid --ds value `{raw}`: {e}"))?;
                }
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, ds, dir, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_name(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, ds, dir, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_name(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, ds)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(scenario: Scenario, ds: f64, dir: &Path, overwrite: bool) -> Result<(), String> {
        let output = run_scenario(scenario, ds)?;

        let path = dir.join(format!("{}.snap", output.name));
        write_text_file(&path, &output.snapshot, overwrite)?;
        eprintln!("wrote {}", path.display());

        let path = dir.join(format!("{}.obj", output.name));
        write_obj_file(&path, &output.mesh, output.name, overwrite)?;
        eprintln!("wrote {}", path.display());

        print_summary(&output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} faces={} | {}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.face_count(),
            output.diag.summary()
        );
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
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &SurfaceMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# ghx-surface-mesh mesh_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in &mesh.vertices {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
        }

        for face in &mesh.faces {
            write!(w, "f").map_err(|e| format!("write obj: {e}"))?;
            for idx in face.corners() {
                write!(w, " {}", idx + 1).map_err(|e| format!("write obj: {e}"))?;
            }
            writeln!(w).map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
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
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
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

    fn write_diagnostics(out: &mut String, diag: &MeshBuildDiagnostics) {
        let _ = writeln!(out, "diag.grid {} {}", diag.rows, diag.cols);
        let _ = writeln!(out, "diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "diag.quad_count {}", diag.quad_count);
        let _ = writeln!(out, "diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "diag.welded_vertex_count {}", diag.welded_vertex_count);
        let _ = writeln!(out, "diag.glued_vertex_count {}", diag.glued_vertex_count);
        let _ = writeln!(out, "diag.removed_vertex_count {}", diag.removed_vertex_count);
        let _ = writeln!(out, "diag.fallback_face_count {}", diag.fallback_face_count);
        let _ = writeln!(out, "diag.enclosed {}", diag.enclosed);
        let _ = writeln!(out, "diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &SurfaceMesh) {
        let _ = writeln!(out, "mesh.vertices {}", mesh.vertex_count());
        for p in mesh.vertices.iter().copied() {
            write_point_line(out, "v", p);
        }
        let _ = writeln!(out, "mesh.faces {}", mesh.face_count());
        for face in &mesh.faces {
            let [a, b, c, d] = face.indices;
            let _ = writeln!(out, "f{} {a} {b} {c} {d}", face.n);
        }
    }

    fn snapshot(scenario: &str, ds: f64, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# ghx-surface-mesh snapshot v1");
        let _ = writeln!(out, "scenario {scenario}");
        let _ = write!(out, "ds ");
        write_f64(&mut out, ds);
        out.push('\n');
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        TwistedRibbon,
        Sphere,
        Torus,
        Plane,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::TwistedRibbon,
            Scenario::Sphere,
            Scenario::Torus,
            Scenario::Plane,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::TwistedRibbon => "twisted_ribbon",
                Scenario::Sphere => "sphere",
                Scenario::Torus => "torus",
                Scenario::Plane => "plane",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }

        fn surface(self) -> Result<MeshedSurface, String> {
            Ok(match self {
                Scenario::TwistedRibbon => MeshedSurface::from_surface(TwistedRibbon::new(1.0, 0.2, 1.0)?),
                Scenario::Sphere => MeshedSurface::from_surface(SphereSurface::new(Point3::ORIGIN, 1.0)?),
                Scenario::Torus => MeshedSurface::from_surface(TorusSurface::new(Point3::ORIGIN, 2.0, 0.5)?),
                Scenario::Plane => MeshedSurface::from_surface(PlaneSurface::new(
                    Point3::ORIGIN,
                    Vec3::new(2.0, 0.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                )),
            })
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: SurfaceMesh,
        diag: MeshBuildDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, ds: f64) -> Result<ScenarioOutput, String> {
        let mut surface = scenario.surface()?;
        surface
            .ensure_triangulated_for(ds, None)
            .map_err(|e| format!("{}: {e}", scenario.name()))?;

        let mesh = surface.mesh().clone();
        let diag = surface.diagnostics().cloned().unwrap_or_default();
        let snapshot = snapshot(scenario.name(), ds, |out| {
            write_diagnostics(out, &diag);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: scenario.name(),
            mesh,
            diag,
            snapshot,
        })
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
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
