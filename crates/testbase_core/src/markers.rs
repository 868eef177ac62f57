//! Textual markers recognised when scanning example scripts.
//!
//! Script scanning is a line-oriented substring heuristic. Keeping the spellings here means the scanner, the
//! checker, and any stricter metadata source agree on what each marker looks like.

/// Extension of a scannable script.
pub const SCRIPT_EXTENSION: &str = ".py";

/// Package initialiser; never turned into a test.
pub const PACKAGE_INIT: &str = "__init__.py";

/// Leading character of a hidden directory name.
pub const HIDDEN_PREFIX: char = '.';

/// Guarded entry point (`if __name__ == "__main__":`).
pub const MAIN_GUARD: &str = "__name__";

/// Start of a run-hook definition.
pub const RUN_HOOK_SIGNATURE: &str = "def run_script(";

/// Parameter that makes a run-hook selectable between split and combined workloads.
pub const RUN_HOOK_SPLIT_PARAM: &str = " split:";

/// Comment introducing the binaries expected when running combined.
pub const COMBINED_BINARIES: &str = "combined binaries";

/// Comment introducing the binaries expected when running split.
pub const SPLIT_BINARIES: &str = "split binaries";

/// Opening bracket of a binaries list.
pub const LIST_OPEN: char = '[';

/// Closing bracket of a binaries list.
pub const LIST_CLOSE: char = ']';

/// Comment marker stripped from multi-line binaries lists.
pub const COMMENT_MARKER: char = '#';

/// Import that makes a script responsible for calling `show` at least once.
pub const PLOTTING_IMPORT: &str = "import matplotlib.pyplot";

/// Whether a line declares a split-capable run-hook.
pub fn is_run_hook(line: &str) -> bool {
    line.contains(RUN_HOOK_SIGNATURE) && line.contains(RUN_HOOK_SPLIT_PARAM)
}

/// Whether a file name is a script that should be classified.
pub fn is_script_file(file_name: &str) -> bool {
    file_name.ends_with(SCRIPT_EXTENSION) && file_name != PACKAGE_INIT
}

/// Whether a directory name marks a hidden directory.
pub fn is_hidden_dir(dir_name: &str) -> bool {
    dir_name.starts_with(HIDDEN_PREFIX)
}
