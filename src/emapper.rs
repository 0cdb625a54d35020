//! Construction and chaining of the two `emapper.py` invocations per input file.

use std::{
    path::{Path, PathBuf},
    process::Command,
};
use crate::{
    Error,
    err::add_path,
    ext,
};

/// Search step writes candidate ortholog hits to `<stem>.emapper.seed_orthologs`.
pub const SEED_ORTHOLOGS_SUFFIX: &'static str = ".emapper.seed_orthologs";
/// Annotation step output stem is `<stem>_annot`.
pub const ANNOT_SUFFIX: &'static str = "_annot";

/// Parameters of the diamond search step.
#[derive(Clone)]
pub struct SearchParams {
    /// Diamond database with eggNOG reference proteins.
    pub db: PathBuf,
    /// Diamond sensitivity mode.
    pub sensmode: String,
    /// Minimal percent identity of reported hits.
    pub min_pident: f64,
    /// Minimal query coverage of reported hits.
    pub min_query_cover: f64,
    /// Maximal e-value of reported hits.
    pub max_evalue: f64,
    /// Number of workers, forwarded to emapper (unrelated to this program, which is sequential).
    pub cpu: u16,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            db: PathBuf::from(
                "/home/anshu/upasana/Mitoinfect/Orthologs/eggnog-mapper/data/eggnog_BacteriaDB.dmnd"),
            sensmode: "more-sensitive".to_string(),
            min_pident: 80.0,
            min_query_cover: 90.0,
            max_evalue: 1e-4,
            cpu: 16,
        }
    }
}

/// Parameters of the annotation step.
#[derive(Clone)]
pub struct AnnotParams {
    /// NCBI taxon, restricting both annotation targets and the taxonomic scope.
    pub taxon: u32,
}

impl Default for AnnotParams {
    fn default() -> Self {
        // 2 = Bacteria.
        Self { taxon: 2 }
    }
}

/// Returns the output stem for the input file:
/// base name without extension, placed under `out_dir` when one is given.
pub fn output_stem(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let base = input.file_stem().unwrap_or_else(|| input.as_os_str());
    match out_dir {
        Some(dir) => dir.join(base),
        None => PathBuf::from(base),
    }
}

/// Seed-orthologs file, which the search step produces for the given output stem.
pub fn seed_orthologs_path(stem: &Path) -> PathBuf {
    ext::sys::append_path(stem, SEED_ORTHOLOGS_SUFFIX)
}

/// First command: diamond search against the reference database,
/// annotation phase disabled, only the seed-orthologs table is produced.
pub fn search_command(emapper: &Path, input: &Path, stem: &Path, params: &SearchParams) -> Command {
    let mut command = Command::new(emapper);
    command
        .args(&["-m", "diamond"])
        .arg("--dmnd_db").arg(&params.db)
        .args(&[
            "--sensmode", &params.sensmode,
            "--pident", &params.min_pident.to_string(),
            "--query_cover", &params.min_query_cover.to_string(),
            "--evalue", &params.max_evalue.to_string(),
            ])
        .arg("--no_annot") // Skip annotation, stop after the seed-orthologs table.
        .arg("-i").arg(input)
        .arg("-o").arg(stem)
        .args(&["--cpu", &params.cpu.to_string()]);
    command
}

/// Second command: no new search, annotates the seed-orthologs table of the first command.
pub fn annotate_command(emapper: &Path, seed_orthologs: &Path, stem: &Path, params: &AnnotParams) -> Command {
    let taxon = params.taxon.to_string();
    let mut command = Command::new(emapper);
    command
        .args(&["-m", "no_search"])
        .arg("--annotate_hits_table").arg(seed_orthologs)
        .arg("-o").arg(stem)
        .arg("--dbmem")            // Load the annotation database in memory,
        .arg("--report_orthologs") // Report predicted orthologs next to the annotations.
        .args(&[
            "--target_orthologs", "one2one", // Restrict to one-to-one ortholog relationships,
            "--target_taxa", &taxon,
            "--tax_scope", &taxon,
            ]);
    command
}

/// Synchronous execution of an external command:
/// blocks until the process exits, `Ok(())` exactly on a zero exit status.
pub trait Runner {
    fn run(&mut self, command: &mut Command) -> Result<(), Error>;
}

/// Runner, which actually spawns processes (see `ext::sys::run`).
pub struct SysRunner;

impl Runner for SysRunner {
    fn run(&mut self, command: &mut Command) -> Result<(), Error> {
        ext::sys::run(command)
    }
}

/// Processes a single input file: runs the search step and, only if it succeeded,
/// the annotation step. Returns true if both steps exited zero.
/// A failed step is logged and consumed, the batch is expected to continue.
/// Returns an error only for problems outside the two commands (unwritable output directory).
pub fn process_file(
    runner: &mut impl Runner,
    emapper: &Path,
    input: &Path,
    out_dir: Option<&Path>,
    search: &SearchParams,
    annot: &AnnotParams,
) -> Result<bool, Error>
{
    if let Some(dir) = out_dir {
        ext::sys::mkdir(dir).map_err(add_path!(dir))?;
    }
    let stem = output_stem(input, out_dir);

    log::info!("Processing {}", ext::fmt::path(input));
    let mut command1 = search_command(emapper, input, &stem, search);
    log::debug!("    {}", ext::fmt::command(&command1));
    if let Err(e) = runner.run(&mut command1) {
        log::error!("Error running first command for {}: {}", ext::fmt::path(input), e.display());
        return Ok(false);
    }

    let seed_orthologs = seed_orthologs_path(&stem);
    let annot_stem = ext::sys::append_path(&stem, ANNOT_SUFFIX);
    let mut command2 = annotate_command(emapper, &seed_orthologs, &annot_stem, annot);
    log::debug!("    {}", ext::fmt::command(&command2));
    if let Err(e) = runner.run(&mut command2) {
        log::error!("Error running second command for {}: {}", ext::fmt::path(input), e.display());
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runner, which does not spawn anything: remembers argument vectors
    /// and fails the invocation with the given index.
    #[derive(Default)]
    struct MockRunner {
        calls: Vec<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl Runner for MockRunner {
        fn run(&mut self, command: &mut Command) -> Result<(), Error> {
            let ix = self.calls.len();
            self.calls.push(std::iter::once(command.get_program())
                .chain(command.get_args())
                .map(|s| s.to_string_lossy().into_owned())
                .collect());
            if self.fail_at == Some(ix) {
                Err(Error::Subprocess("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn args_of(call: &[String]) -> Vec<&str> {
        call.iter().map(String::as_str).collect()
    }

    #[test]
    fn stem_with_and_without_output_dir() {
        let input = Path::new("sample.fasta");
        assert_eq!(output_stem(input, Some(Path::new("/out"))), PathBuf::from("/out/sample"));
        assert_eq!(output_stem(input, None), PathBuf::from("sample"));
        assert_eq!(output_stem(Path::new("/data/in/genome.faa"), Some(Path::new("/out"))),
            PathBuf::from("/out/genome"));
    }

    #[test]
    fn seed_orthologs_follow_stem() {
        assert_eq!(seed_orthologs_path(Path::new("/out/sample")),
            PathBuf::from("/out/sample.emapper.seed_orthologs"));
    }

    #[test]
    fn search_command_arguments() {
        let command = search_command(Path::new("emapper.py"), Path::new("in/a.fasta"),
            Path::new("out/a"), &SearchParams::default());
        let rendered: Vec<_> = command.get_args().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(rendered, vec![
            "-m", "diamond",
            "--dmnd_db", "/home/anshu/upasana/Mitoinfect/Orthologs/eggnog-mapper/data/eggnog_BacteriaDB.dmnd",
            "--sensmode", "more-sensitive",
            "--pident", "80",
            "--query_cover", "90",
            "--evalue", "0.0001",
            "--no_annot",
            "-i", "in/a.fasta",
            "-o", "out/a",
            "--cpu", "16",
        ]);
    }

    #[test]
    fn annotate_command_arguments() {
        let command = annotate_command(Path::new("emapper.py"),
            Path::new("out/a.emapper.seed_orthologs"), Path::new("out/a_annot"), &AnnotParams::default());
        let rendered: Vec<_> = command.get_args().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(rendered, vec![
            "-m", "no_search",
            "--annotate_hits_table", "out/a.emapper.seed_orthologs",
            "-o", "out/a_annot",
            "--dbmem",
            "--report_orthologs",
            "--target_orthologs", "one2one",
            "--target_taxa", "2",
            "--tax_scope", "2",
        ]);
    }

    #[test]
    fn both_steps_run_when_first_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let mut runner = MockRunner::default();
        let success = process_file(&mut runner, Path::new("emapper.py"), Path::new("a.fasta"),
            Some(&out_dir), &SearchParams::default(), &AnnotParams::default()).unwrap();
        assert!(success);
        assert_eq!(runner.calls.len(), 2);
        assert!(args_of(&runner.calls[0]).contains(&"--no_annot"));
        assert!(args_of(&runner.calls[1]).contains(&"no_search"));
        // Output directory was created before the first invocation.
        assert!(out_dir.is_dir());
    }

    #[test]
    fn annotation_skipped_when_search_fails() {
        let mut runner = MockRunner { fail_at: Some(0), ..Default::default() };
        let success = process_file(&mut runner, Path::new("emapper.py"), Path::new("a.fasta"),
            None, &SearchParams::default(), &AnnotParams::default()).unwrap();
        assert!(!success);
        assert_eq!(runner.calls.len(), 1);
    }

    #[test]
    fn failed_annotation_marks_file_failed() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        // Pretend the search step already produced its artifact.
        let seed = out_dir.join("a.emapper.seed_orthologs");
        std::fs::write(&seed, b"query\thit\n").unwrap();

        let mut runner = MockRunner { fail_at: Some(1), ..Default::default() };
        let success = process_file(&mut runner, Path::new("emapper.py"), Path::new("a.fasta"),
            Some(&out_dir), &SearchParams::default(), &AnnotParams::default()).unwrap();
        assert!(!success);
        assert_eq!(runner.calls.len(), 2);
        // The search artifact is left on disk untouched.
        assert_eq!(std::fs::read(&seed).unwrap(), b"query\thit\n");
    }
}
