//! Document commit rules, deletion, geo fields and unindexed fields served by
//! a value provider.

use std::collections::HashMap;
use std::sync::Arc;

use quiver::prelude::*;

fn keys(index: &Index, query: &QueryNode) -> Result<Vec<String>> {
    let Some(mut results) = index.search(query)? else {
        return Ok(Vec::new());
    };
    Ok(results
        .collect_keys()?
        .into_iter()
        .map(|k| String::from_utf8_lossy(&k).into_owned())
        .collect())
}

#[test]
fn test_dropped_document_never_returned() -> Result<()> {
    let index = Index::create("idx", IndexConfig::default())?;
    index.create_text_field("body")?;
    index.create_numeric_field("n")?;
    for (key, n) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
        index.add_document(Document::new(key, 1.0).add_text("body", "common").add_numeric("n", n))?;
    }

    assert!(index.drop_document("b"));
    assert!(!index.contains("b"));
    assert_eq!(index.num_docs(), 2);
    assert_eq!(keys(&index, &QueryNode::token("body", "common"))?, vec!["a", "c"]);
    assert_eq!(keys(&index, &QueryNode::numeric("n", 0.0, 10.0, true, true))?, vec!["a", "c"]);
    assert_eq!(keys(&index, &QueryNode::not(QueryNode::token("body", "other")))?, vec!["a", "c"]);

    // Re-adding the key gets a fresh id.
    let id = index.add_document(Document::new("b", 1.0).add_text("body", "common"))?;
    assert_eq!(id, 4);
    assert_eq!(keys(&index, &QueryNode::token("body", "common"))?, vec!["a", "c", "b"]);
    Ok(())
}

#[test]
fn test_failed_commit_leaves_no_document() -> Result<()> {
    let index = Index::create("idx", IndexConfig::default())?;
    index.create_text_field("body")?;
    index.create_numeric_field("n")?;

    let doc = Document::new("a", 1.0).add_text("body", "hello").add_text("n", "not a number");
    assert!(matches!(index.add_document(doc), Err(QuiverError::Field(_))));
    assert!(!index.contains("a"));
    assert!(index.search(&QueryNode::token("body", "hello"))?.is_none());
    assert_eq!(index.info().stats.num_documents, 0);
    Ok(())
}

#[test]
fn test_geo_radius() -> Result<()> {
    let index = Index::create("idx", IndexConfig::default())?;
    index.create_geo_field("loc")?;
    index.add_document(Document::new("paris", 1.0).add_text("loc", "2.3522,48.8566"))?;
    index.add_document(Document::new("versailles", 1.0).add_geo("loc", GeoPoint::new(2.1301, 48.8049)?))?;
    index.add_document(Document::new("london", 1.0).add_text("loc", "-0.1276,51.5072"))?;

    let center = GeoPoint::new(2.3522, 48.8566)?;
    let near = QueryNode::geo("loc", center, 25.0, DistanceUnit::Kilometers);
    assert_eq!(keys(&index, &near)?, vec!["paris", "versailles"]);

    let far = QueryNode::geo("loc", center, 400.0, DistanceUnit::Miles);
    assert_eq!(keys(&index, &far)?, vec!["paris", "versailles", "london"]);

    assert!(index.add_document(Document::new("bad", 1.0).add_text("loc", "200,100")).is_err());
    assert!(index.search(&QueryNode::geo("loc", center, -1.0, DistanceUnit::Meters)).is_err());
    Ok(())
}

#[test]
fn test_unindexed_field_uses_value_provider() -> Result<()> {
    let stored: Arc<HashMap<Vec<u8>, FieldValue>> = Arc::new(HashMap::from([
        (b"a".to_vec(), FieldValue::Text("quiet river".into())),
        (b"b".to_vec(), FieldValue::Text("loud river".into())),
        (b"c".to_vec(), FieldValue::Text("quiet lake".into())),
    ]));
    let values = Arc::clone(&stored);
    let provider = move |field: &str, key: &[u8]| {
        if field == "notes" { values.get(key).cloned() } else { None }
    };

    let index = Index::create("idx", IndexConfig::default())?.with_value_provider(Arc::new(provider));
    index.create_text_field("title")?;
    index.create_text_field("notes")?;
    index.set_field_options("notes", FieldOptions::NOINDEX)?;

    for key in ["a", "b", "c"] {
        let notes = stored[key.as_bytes()].as_text().unwrap_or_default().to_string();
        index.add_document(Document::new(key, 1.0).add_text("title", "entry").add_text("notes", notes))?;
    }

    assert_eq!(keys(&index, &QueryNode::token("notes", "quiet"))?, vec!["a", "c"]);
    let both = QueryNode::intersect(vec![
        QueryNode::token("notes", "river"),
        QueryNode::token("title", "entry"),
    ]);
    assert_eq!(keys(&index, &both)?, vec!["a", "b"]);

    // Unindexed fields are left out of any-field matching.
    assert!(index.search(&QueryNode::token_any("quiet"))?.is_none());
    Ok(())
}

#[test]
fn test_unindexed_field_without_provider_is_an_error() -> Result<()> {
    let index = Index::create("idx", IndexConfig::default())?;
    index.create_numeric_field("price")?;
    index.set_field_options("price", FieldOptions::NOINDEX)?;
    index.add_document(Document::new("a", 1.0).add_numeric("price", 5.0))?;

    let err = index.search(&QueryNode::numeric("price", 0.0, 10.0, true, true)).unwrap_err();
    assert!(matches!(err, QuiverError::Query(_)));
    Ok(())
}
