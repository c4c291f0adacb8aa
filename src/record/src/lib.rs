pub mod builder;
pub mod errors;
pub mod hash;
pub mod memory;
pub mod reader;
pub mod schema;

pub use builder::RecordBuilder;
pub use errors::{Error, Result};
pub use memory::{Container, MemoryFactory, OnHeapMemoryFactory};
pub use reader::{read_records, MapKey, RecordView};
pub use schema::{predefined_tag, FieldDef, FieldType, RecordSchema};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn schema_with_string_and_map() -> Arc<RecordSchema> {
        Arc::new(
            RecordSchema::new(
                vec![
                    FieldDef::new("ts", FieldType::Long),
                    FieldDef::new("workspace", FieldType::String),
                    FieldDef::new("tags", FieldType::Map),
                ],
                1, // "workspace" onward counts toward the rolling hash
                vec!["host".to_string(), "region".to_string()],
            )
            .unwrap(),
        )
    }

    #[test]
    fn round_trips_a_single_record() {
        let schema = schema_with_string_and_map();
        let factory = Arc::new(OnHeapMemoryFactory::default());
        let mut builder = RecordBuilder::new(schema.clone(), factory);

        builder.start_new_record().unwrap();
        builder.add_long(42).unwrap();
        builder.add_string(b"prod").unwrap();
        builder.start_map().unwrap();
        builder.add_map_key_value("host", "h1").unwrap();
        builder.add_map_key_value("zz-custom", "v").unwrap();
        builder.end_map().unwrap();
        builder.end_record(true).unwrap();

        let bytes = builder.current_container().trimmed_array().to_vec();
        let records = read_records(&schema, &bytes);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.get_long(0), 42);
        assert_eq!(r.get_string(1), b"prod");
        let map = r.get_map(2);
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].0, MapKey::Predefined(0));
        assert_eq!(map[0].1, b"h1");
        assert_eq!(map[1].0, MapKey::Named("zz-custom".to_string()));
    }

    #[test]
    fn record_is_word_aligned_and_header_coherent() {
        let schema = schema_with_string_and_map();
        let factory = Arc::new(OnHeapMemoryFactory::default());
        let mut builder = RecordBuilder::new(schema, factory);

        builder.start_new_record().unwrap();
        builder.add_long(1).unwrap();
        builder.add_string(b"a").unwrap();
        builder.start_map().unwrap();
        builder.end_map().unwrap();
        builder.end_record(true).unwrap();

        let container = builder.current_container();
        assert_eq!(container.len() % 4, 0);
        assert_eq!(container.array()[4..8], 0i32.to_le_bytes());
    }

    #[test]
    fn rolling_hash_only_folds_partition_key_fields() {
        let schema = schema_with_string_and_map();
        let factory = Arc::new(OnHeapMemoryFactory::default());
        let mut builder = RecordBuilder::new(schema.clone(), factory);

        builder.start_new_record().unwrap();
        builder.add_long(7).unwrap(); // plain numeric field, must not affect hash
        builder.add_string(b"prod").unwrap();
        builder.start_map().unwrap();
        builder.end_map().unwrap();
        builder.end_record(true).unwrap();

        let bytes = builder.current_container().trimmed_array().to_vec();
        let expected = crate::hash::combine_hash(7, crate::hash::hash32(b"prod"));
        assert_eq!(read_records(&schema, &bytes)[0].hash(), expected);
    }

    #[test]
    fn overflow_splits_across_containers_and_preserves_stream() {
        let schema = Arc::new(
            RecordSchema::new(
                vec![
                    FieldDef::new("ts", FieldType::Long),
                    FieldDef::new("val", FieldType::String),
                ],
                1,
                vec![],
            )
            .unwrap(),
        );
        let factory = Arc::new(OnHeapMemoryFactory::new(2048));
        let mut builder = RecordBuilder::new(schema.clone(), factory);

        let mut expected_vals = Vec::new();
        for i in 0..200i64 {
            builder.start_new_record().unwrap();
            builder.add_long(i).unwrap();
            let s = format!("value-{i:03}-padding-to-about-fifty-bytes-xx");
            builder.add_string(s.as_bytes()).unwrap();
            builder.end_record(true).unwrap();
            expected_vals.push(s);
        }

        let snapshots = builder.optimal_container_bytes(false);
        assert!(snapshots.len() >= 2);

        let mut seen = Vec::new();
        for snap in &snapshots {
            for rec in read_records(&schema, snap) {
                seen.push((rec.get_long(0), String::from_utf8(rec.get_string(1).to_vec()).unwrap()));
            }
        }
        assert_eq!(seen.len(), 200);
        for (i, (ts, val)) in seen.iter().enumerate() {
            assert_eq!(*ts, i as i64);
            assert_eq!(val, &expected_vals[i]);
        }
    }

    #[test]
    fn record_too_large_is_rejected() {
        let schema = Arc::new(
            RecordSchema::new(vec![FieldDef::new("s", FieldType::String)], 0, vec![]).unwrap(),
        );
        let factory = Arc::new(OnHeapMemoryFactory::new(2048));
        let mut builder = RecordBuilder::new(schema, factory);
        builder.start_new_record().unwrap();
        let huge = vec![b'x'; 4000];
        let err = builder.add_string(&huge).unwrap_err();
        assert!(matches!(err, Error::RecordTooLarge { .. }));
    }
}
