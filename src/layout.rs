use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const OUTPUT_SUBFOLDERS: [&str; 6] = ["train", "meta", "review", "filtered", "user", "item"];

/// Where the files of one category live, on both the input and the output
/// side of the metadata/review tools.
#[derive(Debug, Clone)]
pub struct CategoryLayout {
    input_dir: PathBuf,
    output_dir: PathBuf,
    category: String,
    part: Option<usize>,
}

impl CategoryLayout {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            category: category.into(),
            part: None,
        }
    }

    /// Points the review paths at `{category}_part{part}` files produced by
    /// the splitter.
    pub fn with_part(mut self, part: Option<usize>) -> Self {
        self.part = part;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn review_stem(&self) -> String {
        match self.part {
            Some(part) => format!("{}_part{part}", self.category),
            None => self.category.clone(),
        }
    }

    pub fn train_input(&self) -> PathBuf {
        self.input_dir
            .join("train")
            .join(format!("{}.csv", self.category))
    }

    pub fn meta_input(&self) -> PathBuf {
        prefer_gz(
            self.input_dir
                .join("meta")
                .join(format!("meta_{}.jsonl", self.category)),
        )
    }

    pub fn review_input(&self) -> PathBuf {
        prefer_gz(
            self.input_dir
                .join("review")
                .join(format!("{}.jsonl", self.review_stem())),
        )
    }

    pub fn train_output(&self) -> PathBuf {
        self.output_dir
            .join("train")
            .join(format!("{}.csv", self.category))
    }

    pub fn meta_output(&self) -> PathBuf {
        self.output_dir
            .join("meta")
            .join(format!("meta_{}.json", self.category))
    }

    pub fn filtered_output(&self) -> PathBuf {
        self.output_dir
            .join("filtered")
            .join(format!("filtered_{}.json", self.category))
    }

    pub fn review_output(&self) -> PathBuf {
        self.output_dir
            .join("review")
            .join(format!("{}.json", self.review_stem()))
    }

    pub fn user_output(&self) -> PathBuf {
        self.output_dir
            .join("user")
            .join(format!("user_{}.json", self.category))
    }

    pub fn item_output(&self) -> PathBuf {
        self.output_dir
            .join("item")
            .join(format!("item_{}.json", self.category))
    }

    pub fn prepare_output_dirs(&self) -> Result<()> {
        for sub in OUTPUT_SUBFOLDERS {
            let dir = self.output_dir.join(sub);
            fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        Ok(())
    }
}

// A plain `.jsonl` wins; the compressed dump is used only when it is the
// sole copy on disk.
fn prefer_gz(plain: PathBuf) -> PathBuf {
    if plain.exists() {
        return plain;
    }
    let mut gz = plain.clone().into_os_string();
    gz.push(".gz");
    let gz = PathBuf::from(gz);
    if gz.exists() { gz } else { plain }
}
