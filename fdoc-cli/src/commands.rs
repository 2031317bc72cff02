//! CLI command implementations.

use colored::Colorize;
use fdoc_core::config::{CONFIG_DIR, CONFIG_FILE};
use fdoc_core::{
    lookup_doc, normalize_path, require_project_root, CacheNamespace, ConfigSource, FileAccess,
    ImportExtractor, IndexStore, JsonConfigSource, LocalStorage, ProjectConfig, ScanConfig,
};
use fdoc_graph::{GraphBuilder, TreeBuilder, TreeItem};
use fdoc_index::{IndexOutcome, Indexer, ProjectWatcher, ScanReport};
use fdoc_sandbox::{
    comment_block, find_doc_comments, format_values, remove_comment, write_fixture, Sandbox,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Everything a command needs to work on one project.
struct Project {
    root: PathBuf,
    config: Arc<dyn ConfigSource>,
    files: FileAccess,
    extractor: Arc<ImportExtractor>,
}

impl Project {
    fn open(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(require_project_root(root)?)?;
        debug!("Project root: {}", root.display());
        let config: Arc<dyn ConfigSource> = Arc::new(JsonConfigSource::for_project(&root));
        let files = FileAccess::new(Arc::new(LocalStorage), Arc::new(IndexStore::new()));
        let extractor = Arc::new(ImportExtractor::new(files.clone(), Arc::clone(&config)));
        Ok(Self {
            root,
            config,
            files,
            extractor,
        })
    }

    fn store(&self) -> &Arc<IndexStore> {
        self.files.store()
    }

    fn indexer(&self) -> Indexer {
        Indexer::with_extractor(
            &self.root,
            self.files.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.extractor),
        )
    }

    fn trees(&self) -> Result<TreeBuilder> {
        Ok(TreeBuilder::new(&self.root, Arc::clone(&self.extractor))?)
    }

    /// Absolute path of a file argument; relative paths are taken from
    /// the current directory, falling back to the project root.
    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            return PathBuf::from(normalize_path(file));
        }
        if let Ok(found) = fs::canonicalize(file) {
            return found;
        }
        PathBuf::from(normalize_path(&self.root.join(file)))
    }

    /// Scan and index with a spinner.
    async fn build_index(&self) -> Result<(ScanReport, IndexOutcome)> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message("Scanning files...");

        let indexer = self.indexer();
        let scan = indexer.scan().await?;
        spinner.set_message("Building reverse index...");
        let index = indexer.index().await;

        spinner.finish_and_clear();
        Ok((scan, index))
    }
}

/// Create the configuration file.
pub fn init(root: &Path) -> Result<()> {
    let root = require_project_root(root)?;
    let config_dir = root.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(&config_dir)?;

    let config = ProjectConfig {
        scanning: ScanConfig {
            directories: vec!["/components".into(), "/stores".into()],
            extensions: vec![".vue".into(), ".ts".into()],
            alias: "@/".into(),
            ..ScanConfig::default()
        },
        ..ProjectConfig::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("{} Initialized fdoc in {}", "✓".green(), root.display());
    println!("  Edit {} to match your project", config_path.display().to_string().cyan());
    println!("  Run {} to index it", "fdoc index".cyan());

    Ok(())
}

/// Scan and index a project.
pub async fn index(root: &Path, output: Option<&Path>) -> Result<()> {
    let project = Project::open(root)?;
    println!("{}", "Indexing project...".cyan());

    let (scan, outcome) = project.build_index().await?;
    print_scan(&scan);

    match &outcome {
        IndexOutcome::Indexed(report) => println!(
            "{} Indexed {} dependencies ({} imports from {} files) in {}ms",
            "✓".green(),
            report.entries.to_string().cyan(),
            report.edges,
            report.files_with_dependencies,
            report.duration_ms
        ),
        IndexOutcome::Skipped(reason) => {
            println!("{} Index not built: {:?}", "⚠".yellow(), reason)
        }
    }

    if scan.files_found == 0 {
        eprintln!("\n{} No files found. Check:", "⚠ Warning:".yellow());
        eprintln!("  - scanning.directories in {}/{}", CONFIG_DIR, CONFIG_FILE);
        eprintln!("  - scanning.extensions (e.g. \".vue\", \".ts\")");
    }

    if let Some(output) = output {
        export_graph(&project, output)?;
    }

    Ok(())
}

fn print_scan(scan: &ScanReport) {
    println!(
        "{} Loaded {} of {} files from {} directories in {}ms",
        "✓".green(),
        scan.files_loaded.to_string().cyan(),
        scan.files_found,
        scan.directories,
        scan.duration_ms
    );

    if !scan.failures.is_empty() {
        println!("\n{} unreadable paths:", "⚠".yellow());
        for path in scan.failures.iter().take(5) {
            println!("  {}", path.red());
        }
        if scan.failures.len() > 5 {
            println!("  ... and {} more", scan.failures.len() - 5);
        }
    }
}

fn export_graph(project: &Project, output: &Path) -> Result<()> {
    let graph = GraphBuilder::from_store(project.store());
    fs::write(output, serde_json::to_string_pretty(&graph.export())?)?;
    println!("{} Exported to {}", "✓".green(), output.display());
    Ok(())
}

/// Forward dependency tree of a file.
pub async fn deps(root: &Path, file: &Path, json: bool) -> Result<()> {
    let project = Project::open(root)?;
    let path = project.resolve(file);
    let tree = project.trees()?.dependency_tree(&path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print_tree(&tree);
    }
    Ok(())
}

/// Files that import a file.
pub async fn dependents(root: &Path, file: &Path, json: bool) -> Result<()> {
    let project = Project::open(root)?;
    project.build_index().await?;

    let path = project.resolve(file);
    let tree = project.trees()?.cohesion_tree_from_index(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    if tree.children.is_empty() {
        println!("No files import {}", tree.name.cyan());
        return Ok(());
    }

    println!("{} imported by {} files:\n", tree.name.cyan(), tree.children.len());
    for child in &tree.children {
        println!("  {} {}", child.name.yellow(), child.path.dimmed());
    }
    Ok(())
}

fn print_tree(tree: &TreeItem) {
    for line in render_tree(tree) {
        println!("{}", line);
    }
}

/// One line per node; sections are shown in brackets.
fn render_tree(tree: &TreeItem) -> Vec<String> {
    fn walk(item: &TreeItem, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let line = if item.path.is_empty() {
            format!("{}[{}]", indent, item.title.yellow())
        } else if item.cyclic {
            format!("{}{} {}", indent, item.title.cyan(), "(cycle)".red())
        } else if item.title != item.name {
            format!("{}{} {}", indent, item.title.cyan(), item.name.dimmed())
        } else {
            format!("{}{}", indent, item.title.cyan())
        };
        lines.push(line);
        for child in &item.children {
            walk(child, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(tree, 0, &mut lines);
    lines
}

/// Index statistics.
pub async fn status(root: &Path, show_files: bool) -> Result<()> {
    let project = Project::open(root)?;

    if !project.root.join(CONFIG_DIR).join(CONFIG_FILE).exists() {
        println!("{} fdoc not initialized in this directory", "✗".red());
        println!("  Run {} to initialize", "fdoc init".cyan());
        return Ok(());
    }

    let (scan, _) = project.build_index().await?;
    let graph = GraphBuilder::from_store(project.store());
    let stats = graph.stats();
    let scanning = project.config.load_scanning_config()?;

    println!("{}", "📊 fdoc Status".cyan().bold());
    println!();
    println!("  {} {}", "Directories:".dimmed(), scanning.directories.join(", "));
    println!("  {} {}", "Files loaded:".dimmed(), scan.files_loaded);
    println!("  {} {}", "Indexed dependencies:".dimmed(), project.store().indexes.count());
    println!("  {} {}", "Imports:".dimmed(), stats.imports);
    println!("  {} {}", "Import cycles:".dimmed(), stats.cycles);

    let hotspots = graph.hotspots(5);
    if !hotspots.is_empty() {
        println!();
        println!("{}", "🔥 Most imported".cyan().bold());
        for hotspot in hotspots {
            println!(
                "  {} {} {}",
                hotspot.dependents.to_string().yellow(),
                hotspot.name,
                hotspot.path.dimmed()
            );
        }
    }

    let cycles = graph.cycles();
    if !cycles.is_empty() {
        println!();
        println!("{}", "🔁 Import cycles".cyan().bold());
        for cycle in cycles.iter().take(10) {
            println!("  {}", cycle.join(" ↔ ").red());
        }
    }

    if show_files {
        println!();
        println!("{}", "📁 Loaded Files".cyan().bold());
        let files = project.store().files.keys();
        for file in files.iter().take(50) {
            println!("  {}", file.dimmed());
        }
        if files.len() > 50 {
            println!("  ... and {} more", files.len() - 50);
        }
    }

    Ok(())
}

/// Export the import graph to JSON.
pub async fn export(root: &Path, output: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.build_index().await?;
    export_graph(&project, output)
}

/// Dump a cache namespace after indexing.
pub async fn cache(root: &Path, namespace: &str, key: Option<&str>) -> Result<()> {
    let namespace: CacheNamespace = namespace.parse()?;
    let project = Project::open(root)?;
    project.build_index().await?;

    let store = project.store();
    if let Some(key) = key {
        let key = normalize_path(&project.resolve(Path::new(key)));
        if !store.exists(namespace, &key) {
            println!("{} {} has no entry for {}", "✗".red(), namespace, key);
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(&store.snapshot(namespace, Some(&key)))?);
        return Ok(());
    }

    println!(
        "{} {} entries in {}",
        "✓".green(),
        store.count(namespace).to_string().cyan(),
        namespace
    );
    println!("{}", serde_json::to_string_pretty(&store.snapshot(namespace, None))?);
    Ok(())
}

/// Index, then apply file changes to the cache until interrupted.
pub async fn watch(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    let (scan, _) = project.build_index().await?;
    print_scan(&scan);

    let watcher = ProjectWatcher::start(&project.indexer()).await?;
    println!(
        "{} Watching {} directories",
        "✓".green(),
        watcher.directories()
    );
    println!("  Press {} to stop", "Ctrl+C".cyan());

    let mut tick = tokio::time::interval(Duration::from_millis(250));
    let stop = tokio::signal::ctrl_c();
    tokio::pin!(stop);
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = tick.tick() => {
                for change in watcher.poll() {
                    println!("  {} {:?}", "↻".blue(), change);
                }
            }
        }
    }

    Ok(())
}

/// Run a snippet in the sandbox.
pub async fn exec(root: &Path, file: Option<&Path>, comment: bool, fixture: bool) -> Result<()> {
    let project = Project::open(root)?;

    let code = match file {
        Some(file) => fs::read_to_string(file)?,
        None => {
            let mut code = String::new();
            std::io::stdin().read_to_string(&mut code)?;
            code
        }
    };

    let sandbox = Sandbox::new(
        &project.root,
        Arc::clone(project.files.storage()),
        Arc::clone(&project.config),
    );
    let outcome = sandbox.execute(&code).await?;
    if !outcome.is_captured() {
        eprintln!("{} {}", "⚠".yellow(), outcome.describe());
    }
    let formatted = format_values(&outcome.into_values());

    if fixture {
        let path = write_fixture(project.files.storage().as_ref(), &project.root, &formatted).await?;
        println!("{} Fixture written to {}", "✓".green(), path.display());
    } else if comment {
        let block = comment_block(&formatted);
        match file {
            Some(file) => {
                fs::write(file, format!("{}{}", code.trim_end(), block))?;
                println!("{} Result appended to {}", "✓".green(), file.display());
            }
            None => println!("{}{}", code.trim_end(), block),
        }
    } else {
        println!("{}", formatted);
    }

    Ok(())
}

/// List or delete doc comments.
pub fn comments(root: &Path, file: &Path, delete: Option<usize>) -> Result<()> {
    let project = Project::open(root)?;
    let path = project.resolve(file);
    let text = fs::read_to_string(&path)?;
    let found = find_doc_comments(&text);

    if let Some(number) = delete {
        let range = number
            .checked_sub(1)
            .and_then(|i| found.get(i))
            .ok_or_else(|| format!("no comment #{} in {} ({} found)", number, path.display(), found.len()))?;
        fs::write(&path, remove_comment(&text, range.clone()))?;
        println!("{} Comment #{} deleted", "✓".green(), number);
        return Ok(());
    }

    if found.is_empty() {
        println!("No doc comments in {}", path.display());
        return Ok(());
    }

    for (i, range) in found.iter().enumerate() {
        let line = line_of(&text, range.start);
        let first = text[range.clone()].lines().nth(2).unwrap_or("").trim();
        println!(
            "  {} {} {}",
            format!("#{}", i + 1).yellow(),
            format!("line {}", line).dimmed(),
            first
        );
    }
    Ok(())
}

/// 1-indexed line containing byte `offset`.
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Print a documentation page.
pub async fn docs(root: &Path, name: &str) -> Result<()> {
    let project = Project::open(root)?;
    let content = lookup_doc(&project.files, project.config.as_ref(), &project.root, name).await?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdoc_graph::cohesion_tree;

    #[test]
    fn test_render_tree_marks_sections() {
        colored::control::set_override(false);
        let tree = cohesion_tree(
            Path::new("/p/components/Foo.vue"),
            &["/p/components/Panel.vue".to_string()],
        );
        let lines = render_tree(&tree);
        assert_eq!(lines, vec!["Foo.vue", "  Panel.vue"]);
    }

    #[test]
    fn test_line_of() {
        let text = "const a = 1\n\n/**\n*\n1\n*/";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, text.find("/**").unwrap()), 3);
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();

        let config = JsonConfigSource::for_project(dir.path()).load().unwrap();
        assert_eq!(config.scanning.alias, "@/");
        assert_eq!(config.sandbox.execution_timeout_ms, 5000);

        init(dir.path()).unwrap();
    }
}
