//! # 数据集读取模块
//!
//! 提供格式无关的数据集访问能力：发现目录中的数据文件、推断格式、
//! 按行流式读取。管线核心不直接分派文件扩展名，全部格式逻辑收敛在本模块。
//!
//! ## 支持的格式
//! - JSONL (.jsonl / .json)
//! - CSV / TSV (.csv / .tsv)
//! - Parquet (.parquet)
//! - 以上 JSONL/CSV 可叠加 gzip (.gz) 或 zstd (.zst) 压缩
//!
//! ## 依赖关系
//! - 被 `pipeline/` 使用
//! - 使用 `walkdir` 遍历目录
//! - 子模块: jsonl, csv, parquet

pub mod csv;
pub mod jsonl;
pub mod parquet;

use crate::error::{Result, TokencountError};

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一行数据：字段名到值的映射
pub type Row = serde_json::Map<String, serde_json::Value>;

/// 按文件自然顺序产出行的流。`Err` 项为行级错误（非致命）
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// 数据文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Jsonl,
    Csv { delimiter: u8 },
    Parquet,
}

/// 外层压缩格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

/// 数据集中一个已识别的数据文件
#[derive(Debug, Clone)]
pub struct DataFile {
    pub path: PathBuf,
    format: FileFormat,
    compression: Compression,
}

impl DataFile {
    /// 流式读取本文件的所有行
    pub fn rows(&self) -> Result<RowStream> {
        match self.format {
            FileFormat::Jsonl => Ok(jsonl::rows(self.open_reader()?, &self.path)),
            FileFormat::Csv { delimiter } => csv::rows(self.open_reader()?, delimiter, &self.path),
            FileFormat::Parquet => parquet::rows(&self.path),
        }
    }

    /// 推断本文件可见的字段名集合
    ///
    /// 内容无法解析时返回空集合（字段检查对其不生效，行级错误由 `rows` 上报）。
    pub fn schema(&self) -> Result<Vec<String>> {
        match self.format {
            FileFormat::Jsonl => Ok(jsonl::schema(self.open_reader()?, &self.path)),
            FileFormat::Csv { delimiter } => Ok(csv::schema(self.open_reader()?, delimiter)),
            FileFormat::Parquet => parquet::schema(&self.path),
        }
    }

    /// 打开文件并解包外层压缩
    fn open_reader(&self) -> Result<Box<dyn Read>> {
        let file = File::open(&self.path).map_err(|e| TokencountError::FileReadError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        match self.compression {
            Compression::None => Ok(Box::new(file)),
            Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(file))),
            Compression::Zstd => {
                let decoder =
                    zstd::Decoder::new(file).map_err(|e| TokencountError::FileReadError {
                        path: self.path.display().to_string(),
                        source: e,
                    })?;
                Ok(Box::new(decoder))
            }
        }
    }
}

/// 数据集句柄：一个可按行读取的文件目录
#[derive(Debug)]
pub struct Dataset {
    root: PathBuf,
    files: Vec<DataFile>,
    skipped: Vec<PathBuf>,
}

impl Dataset {
    /// 打开数据集目录并发现其中的数据文件
    ///
    /// 文件按文件名排序，保证发现顺序（以及行到批次的分配）可复现。
    /// 不递归子目录，与逐目录统计的使用方式一致。
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(TokencountError::DatasetNotFound {
                path: root.display().to_string(),
            });
        }

        let mut files = Vec::new();
        let mut skipped = Vec::new();

        let walker = WalkDir::new(root)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for entry in walker {
            let path = entry.path().to_path_buf();
            match detect(&path) {
                Some((format, compression)) => files.push(DataFile {
                    path,
                    format,
                    compression,
                }),
                None => skipped.push(path),
            }
        }

        if files.is_empty() {
            return Err(TokencountError::NoFilesFound {
                path: root.display().to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            files,
            skipped,
        })
    }

    /// 数据集根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 已识别的数据文件（按发现顺序）
    pub fn files(&self) -> &[DataFile] {
        &self.files
    }

    /// 未识别而被跳过的文件
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// 快速失败检查：字段必须存在于每个文件的已知 schema 中
    pub fn require_field(&self, field: &str) -> Result<()> {
        for file in &self.files {
            let schema = file.schema()?;
            if !schema.is_empty() && !schema.iter().any(|name| name == field) {
                return Err(TokencountError::FieldNotFound {
                    field: field.to_string(),
                    path: file.path.display().to_string(),
                    available: schema.join(", "),
                });
            }
        }
        Ok(())
    }
}

/// 从文件名推断格式与压缩方式
///
/// 压缩扩展名 (.gz/.zst) 先剥离，再看内层扩展名，与数据湖常见的
/// `data.jsonl.gz` 命名对应。Parquet 自带内部压缩且需要可随机访问的
/// 输入，外层再压缩的 Parquet 不予识别。
fn detect(path: &Path) -> Option<(FileFormat, Compression)> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    let (stem, compression) = if let Some(s) = name.strip_suffix(".gz") {
        (s, Compression::Gzip)
    } else if let Some(s) = name.strip_suffix(".zst") {
        (s, Compression::Zstd)
    } else {
        (name.as_str(), Compression::None)
    };

    let format = if stem.ends_with(".jsonl") || stem.ends_with(".json") {
        FileFormat::Jsonl
    } else if stem.ends_with(".csv") {
        FileFormat::Csv { delimiter: b',' }
    } else if stem.ends_with(".tsv") {
        FileFormat::Csv { delimiter: b'\t' }
    } else if stem.ends_with(".parquet") && compression == Compression::None {
        FileFormat::Parquet
    } else {
        return None;
    };

    Some((format, compression))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn detected(name: &str) -> Option<(FileFormat, Compression)> {
        detect(Path::new(name))
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            detected("data.jsonl"),
            Some((FileFormat::Jsonl, Compression::None))
        );
        assert_eq!(
            detected("data.jsonl.gz"),
            Some((FileFormat::Jsonl, Compression::Gzip))
        );
        assert_eq!(
            detected("data.json.zst"),
            Some((FileFormat::Jsonl, Compression::Zstd))
        );
        assert_eq!(
            detected("data.csv"),
            Some((FileFormat::Csv { delimiter: b',' }, Compression::None))
        );
        assert_eq!(
            detected("data.tsv.gz"),
            Some((FileFormat::Csv { delimiter: b'\t' }, Compression::Gzip))
        );
        assert_eq!(
            detected("DATA.PARQUET"),
            Some((FileFormat::Parquet, Compression::None))
        );
        assert_eq!(detected("data.parquet.gz"), None);
        assert_eq!(detected("notes.txt"), None);
        assert_eq!(detected("archive.gz"), None);
    }

    #[test]
    fn test_open_discovers_sorted_and_skips_unknown() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "text\nhi\n").unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"text\": \"hi\"}\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "ignore me").unwrap();

        let dataset = Dataset::open(dir.path()).unwrap();
        let names: Vec<_> = dataset
            .files()
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.csv"]);
        assert_eq!(dataset.skipped().len(), 1);
    }

    #[test]
    fn test_open_missing_directory() {
        let err = Dataset::open(Path::new("/nonexistent/tokencount-test")).unwrap_err();
        assert!(matches!(err, TokencountError::DatasetNotFound { .. }));
    }

    #[test]
    fn test_open_empty_directory() {
        let dir = tempdir().unwrap();
        let err = Dataset::open(dir.path()).unwrap_err();
        assert!(matches!(err, TokencountError::NoFilesFound { .. }));
    }

    #[test]
    fn test_require_field() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"text\": \"hi\", \"id\": 1}\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.csv"), "text,id\nhello,2\n").unwrap();

        let dataset = Dataset::open(dir.path()).unwrap();
        dataset.require_field("text").unwrap();

        let err = dataset.require_field("body").unwrap_err();
        match err {
            TokencountError::FieldNotFound { field, .. } => assert_eq!(field, "body"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_gzipped_jsonl_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.jsonl.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Default::default());
        encoder
            .write_all(b"{\"text\": \"hello\"}\n{\"text\": \"world\"}\n")
            .unwrap();
        encoder.finish().unwrap();

        let dataset = Dataset::open(dir.path()).unwrap();
        let rows: Vec<_> = dataset.files()[0]
            .rows()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["text"], "hello");
        assert_eq!(rows[1]["text"], "world");
    }
}
