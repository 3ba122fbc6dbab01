//! # Parquet 读取器
//!
//! 通过 `parquet` crate 的行迭代接口流式读取记录，标量字段转换为
//! JSON 值（下游只关心字符串字段）。
//!
//! ## 依赖关系
//! - 被 `reader/mod.rs` 使用
//! - 使用 `parquet` crate

use crate::error::{Result, TokencountError};
use crate::reader::{Row, RowStream};

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::reader::RowIter;
use parquet::record::Field;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// 流式读取 Parquet 记录
pub fn rows(path: &Path) -> Result<RowStream> {
    let reader = open(path)?;
    let display = path.display().to_string();

    let iter = RowIter::from_file_into(Box::new(reader))
        .enumerate()
        .map(move |(index, record)| match record {
            Ok(record) => {
                let mut row = Row::new();
                for (name, field) in record.get_column_iter() {
                    row.insert(name.clone(), field_to_value(field));
                }
                Ok(row)
            }
            Err(e) => Err(TokencountError::RowDecodeError {
                path: display.clone(),
                row: index as u64 + 1,
                reason: e.to_string(),
            }),
        });

    Ok(Box::new(iter))
}

/// 推断 schema：文件元数据中的叶子列名
pub fn schema(path: &Path) -> Result<Vec<String>> {
    let reader = open(path)?;
    Ok(reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect())
}

fn open(path: &Path) -> Result<SerializedFileReader<File>> {
    let file = File::open(path).map_err(|e| TokencountError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    SerializedFileReader::new(file).map_err(|e| TokencountError::ParquetError {
        path: path.display().to_string(),
        source: e,
    })
}

fn field_to_value(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(v) => Value::Bool(*v),
        Field::Str(v) => Value::String(v.clone()),
        Field::Byte(v) => Value::from(*v),
        Field::Short(v) => Value::from(*v),
        Field::Int(v) => Value::from(*v),
        Field::Long(v) => Value::from(*v),
        Field::UByte(v) => Value::from(*v),
        Field::UShort(v) => Value::from(*v),
        Field::UInt(v) => Value::from(*v),
        Field::ULong(v) => Value::from(*v),
        Field::Float(v) => Value::from(*v),
        Field::Double(v) => Value::from(*v),
        // 嵌套与其余类型对 token 统计无意义
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::data_type::{ByteArray, ByteArrayType};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_text_parquet(path: &Path, values: &[&str]) {
        let schema =
            Arc::new(parse_message_type("message row { required binary text (UTF8); }").unwrap());
        let props = Arc::new(WriterProperties::builder().build());
        let file = File::create(path).unwrap();
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

        let mut row_group = writer.next_row_group().unwrap();
        if let Some(mut column) = row_group.next_column().unwrap() {
            let data: Vec<ByteArray> = values.iter().map(|v| ByteArray::from(*v)).collect();
            column
                .typed::<ByteArrayType>()
                .write_batch(&data, None, None)
                .unwrap();
            column.close().unwrap();
        }
        row_group.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_rows_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        write_text_parquet(&path, &["hello world", ""]);

        assert_eq!(schema(&path).unwrap(), vec!["text"]);

        let rows: Vec<_> = rows(&path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["text"], "hello world");
        assert_eq!(rows[1]["text"], "");
    }

    #[test]
    fn test_open_missing_file() {
        let err = rows(Path::new("/nonexistent/data.parquet")).err().unwrap();
        assert!(matches!(err, TokencountError::FileReadError { .. }));
    }
}
