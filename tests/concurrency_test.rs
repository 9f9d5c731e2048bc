//! Searches running while documents are being committed.

use std::thread;

use quiver::prelude::*;

#[test]
fn test_search_during_ingest() -> Result<()> {
    let index = Index::create("live", IndexConfig::default())?;
    index.create_text_field("body")?;
    index.create_tag_field("tags")?;

    let writers = 4;
    let per_writer = 250;

    thread::scope(|s| {
        for w in 0..writers {
            let index = &index;
            s.spawn(move || {
                for i in 0..per_writer {
                    let doc = Document::new(format!("w{w}-{i}"), 1.0)
                        .add_text("body", format!("shared word{i}"))
                        .add_text("tags", format!("writer-{w}"));
                    index.add_document(doc).expect("commit");
                }
            });
        }

        for _ in 0..2 {
            let index = &index;
            s.spawn(move || {
                for _ in 0..50 {
                    let Some(mut results) = index
                        .search(&QueryNode::token("body", "shared"))
                        .expect("compile")
                    else {
                        continue;
                    };
                    let mut last = 0;
                    while let Some(id) = results.next_id().expect("iterate") {
                        assert!(id > last, "ids must ascend");
                        last = id;
                    }
                }
            });
        }
    });

    assert_eq!(index.num_docs(), writers * per_writer);
    let mut results = index
        .search(&QueryNode::token("body", "shared"))?
        .expect("indexed");
    assert_eq!(results.collect_keys()?.len(), writers * per_writer);

    let query = QueryNode::tag("tags", vec![QueryNode::prefix_any("writer-")]);
    let mut results = index.search(&query)?.expect("indexed");
    assert_eq!(results.collect_keys()?.len(), writers * per_writer);
    Ok(())
}

#[test]
fn test_open_iterator_sees_a_stable_prefix() -> Result<()> {
    let index = Index::create("stable", IndexConfig::default())?;
    index.create_text_field("body")?;
    for i in 0..10 {
        index.add_document(Document::new(format!("d{i}"), 1.0).add_text("body", "word"))?;
    }

    let mut results = index.search(&QueryNode::token("body", "word"))?.expect("indexed");
    assert!(results.next_id()?.is_some());

    // Appends and buffer growth after the iterator opened stay invisible.
    for i in 10..100 {
        index.add_document(Document::new(format!("d{i}"), 1.0).add_text("body", "word"))?;
    }
    index.compact();

    let mut rest = 0;
    while results.next_id()?.is_some() {
        rest += 1;
    }
    assert_eq!(rest, 9);
    Ok(())
}

#[test]
fn test_drop_while_iterating() -> Result<()> {
    let index = Index::create("drop", IndexConfig::default())?;
    index.create_text_field("body")?;
    for key in ["a", "b", "c"] {
        index.add_document(Document::new(key, 1.0).add_text("body", "word"))?;
    }

    let mut results = index.search(&QueryNode::token("body", "word"))?.expect("indexed");
    assert_eq!(results.next_key()?, Some(b"a".to_vec()));
    assert!(index.drop_document("b"));
    assert_eq!(results.next_key()?, Some(b"c".to_vec()));
    assert_eq!(results.next_key()?, None);
    Ok(())
}
