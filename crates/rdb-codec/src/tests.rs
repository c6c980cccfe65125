use crate::*;

fn people_schema() -> Schema {
    Schema::new(vec![
        Column::new("id", ColumnType::Int),
        Column::new("name", ColumnType::Varchar(16)),
        Column::new("score", ColumnType::Float),
        Column::new("joined", ColumnType::Date),
        Column::new("pos", ColumnType::ArrayFloat),
    ])
}

#[test]
fn multi_column_record_round_trips() {
    let schema = people_schema();
    let joined = parse_date("2020-06-15").unwrap();
    let values = vec![
        Value::Int(-12),
        Value::Varchar("grace".to_string()),
        Value::Float(3.5),
        Value::Date(joined),
        Value::ArrayFloat(1.0, -2.5),
    ];

    let record = encode_record(&values, &schema).unwrap();
    assert_eq!(record.len(), schema.record_size());

    let decoded = decode_record(&record, &schema).unwrap();
    let expected = vec![
        Value::Int(-12),
        Value::Varchar("grace".to_string()),
        Value::Float(3.5),
        Value::Varchar("2020-06-15".to_string()),
        Value::ArrayFloat(1.0, -2.5),
    ];
    assert_eq!(decoded, expected);
}

#[test]
fn record_size_accounts_for_every_column_and_tombstone() {
    let schema = people_schema();
    // tombstone(1) + int(4) + varchar(16) + float(4) + date(4) + array(8)
    assert_eq!(schema.record_size(), 1 + 4 + 16 + 4 + 4 + 8);
}

#[test]
fn extract_key_round_trips_through_a_full_record() {
    let schema = people_schema();
    let values = vec![
        Value::Int(900),
        Value::Varchar("han".to_string()),
        Value::Float(0.0),
        Value::Date(0),
        Value::ArrayFloat(0.0, 0.0),
    ];
    let record = encode_record(&values, &schema).unwrap();

    let id_key = extract_key(&record, &schema, 0).unwrap();
    assert_eq!(id_key, encode_key(&Value::Int(900), &ColumnType::Int).unwrap());

    let name_key = extract_key(&record, &schema, 1).unwrap();
    assert_eq!(
        name_key,
        encode_key(&Value::Varchar("han".to_string()), &ColumnType::Varchar(16)).unwrap()
    );
}

#[test]
fn tombstone_byte_defaults_to_live() {
    let schema = Schema::new(vec![Column::new("n", ColumnType::Int)]);
    let record = encode_record(&[Value::Int(1)], &schema).unwrap();
    assert_eq!(record[0], 0);
}

#[test]
fn arity_mismatch_is_rejected() {
    let schema = Schema::new(vec![Column::new("n", ColumnType::Int)]);
    let err = encode_record(&[Value::Int(1), Value::Int(2)], &schema).unwrap_err();
    assert!(matches!(err, CodecError::Arity { expected: 1, got: 2 }));
}
