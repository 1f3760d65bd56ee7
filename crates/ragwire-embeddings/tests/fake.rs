use ragwire_embeddings::{Embeddings, FakeEmbeddings};

#[tokio::test]
async fn same_text_same_vector() {
    let embeddings = FakeEmbeddings::new(8);
    let a = embeddings.embed_query("rust").await.unwrap();
    let b = embeddings.embed_documents(&["rust"]).await.unwrap();
    assert_eq!(a, b[0]);
    assert_eq!(a.len(), 8);
}

#[tokio::test]
async fn vectors_are_normalized() {
    let v = FakeEmbeddings::default().embed_query("hello world").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn empty_text_is_zero_vector() {
    let v = FakeEmbeddings::new(3).embed_query("").await.unwrap();
    assert_eq!(v, vec![0.0, 0.0, 0.0]);
}
