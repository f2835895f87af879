//! PubMed client behaviour against a local mock E-utilities server.

use chrono::NaiveDate;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use pubsift_ingestion::models::{ABSTRACT_UNAVAILABLE, NO_ABSTRACT};
use pubsift_ingestion::query::DateWindow;
use pubsift_ingestion::sources::pubmed::{NcbiIdentity, PubMedClient, RequestPolicy};
use pubsift_ingestion::sources::LiteratureSource;
use pubsift_ingestion::SearchError;

fn client_for(server: &ServerGuard, policy: RequestPolicy) -> PubMedClient {
    PubMedClient::new(NcbiIdentity::default(), policy)
        .unwrap()
        .with_base_url(&server.url())
}

fn window() -> DateWindow {
    DateWindow::years_back(5, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn pmids(n: usize) -> Vec<String> {
    (0..n).map(|i| (30_000_000 + i).to_string()).collect()
}

#[tokio::test]
async fn test_esearch_sends_term_window_and_identity() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("term".into(), "asthma AND humans[MeSH Terms]".into()),
            Matcher::UrlEncoded("retmode".into(), "json".into()),
            Matcher::UrlEncoded("retmax".into(), "20".into()),
            Matcher::UrlEncoded("sort".into(), "pub_date".into()),
            Matcher::UrlEncoded("mindate".into(), "2019/06/03".into()),
            Matcher::UrlEncoded("maxdate".into(), "2024/06/01".into()),
            Matcher::UrlEncoded("tool".into(), "pubsift".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"esearchresult": {"count": "2", "idlist": ["1", "2"]}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let hits = client.search("asthma AND humans[MeSH Terms]", &window(), 20).await.unwrap();

    assert_eq!(hits.total, 2);
    assert_eq!(hits.ids, vec!["1".to_string(), "2".to_string()]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried_exactly_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let result = client.search("asthma", &window(), 10).await;

    assert_eq!(result, Err(SearchError::Status(503)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    assert_eq!(client.search("asthma", &window(), 10).await, Err(SearchError::Status(404)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retry_budget_comes_from_policy() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let policy = RequestPolicy { max_retries: 0, ..RequestPolicy::immediate() };
    let client = client_for(&server, policy);
    assert_eq!(client.search("asthma", &window(), 10).await, Err(SearchError::Status(500)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html><body>Service unavailable</body></html>")
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let result = client.search("asthma", &window(), 10).await;
    assert!(matches!(result, Err(SearchError::Malformed(_))), "{result:?}");
}

#[tokio::test]
async fn test_provider_error_message_is_kept() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"esearchresult": {"errorlist": {"errormessage": ["Search backend failed"]}}}).to_string())
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    assert_eq!(
        client.search("asthma", &window(), 10).await,
        Err(SearchError::Provider("Search backend failed".to_string()))
    );
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let client = PubMedClient::new(NcbiIdentity::default(), RequestPolicy::immediate())
        .unwrap()
        .with_base_url("http://127.0.0.1:1");
    let result = client.search("asthma", &window(), 10).await;
    assert!(matches!(result, Err(SearchError::Connection(_))), "{result:?}");
}

#[tokio::test]
async fn test_summaries_are_fetched_in_batches_of_200() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::UrlEncoded("retmode".into(), "json".into()))
        .with_status(200)
        .with_body(json!({"result": {"uids": []}}).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let summaries = client.fetch_summaries(&pmids(250)).await;

    assert!(summaries.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_abstracts_are_fetched_in_batches_of_50() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("retmode".into(), "xml".into()))
        .with_status(200)
        .with_body("<PubmedArticleSet></PubmedArticleSet>")
        .expect(5)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let ids = pmids(250);
    let abstracts = client.fetch_abstracts(&ids).await;

    assert_eq!(abstracts.found_count(), 0);
    assert_eq!(abstracts.resolve(&ids[0]), NO_ABSTRACT);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_summary_ids_are_skipped() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "1,2,3".into()))
        .with_status(200)
        .with_body(
            json!({"result": {
                "uids": ["1", "3"],
                "1": {"uid": "1", "title": "One", "fulljournalname": "Cell", "pubdate": "2023", "pubtype": ["Review"]},
                "3": {"uid": "3", "title": "Three", "source": "Blood", "pubdate": "2021 May"}
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let ids: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
    let summaries = client.fetch_summaries(&ids).await;

    let got: Vec<&str> = summaries.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(got, vec!["1", "3"]);
    assert_eq!(summaries[1].1.source.as_deref(), Some("Blood"));
}

#[tokio::test]
async fn test_failed_abstract_batch_only_affects_its_articles() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "1".into()))
        .with_status(200)
        .with_body(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</PMID>\
             <Article><Abstract><AbstractText>Fine.</AbstractText></Abstract></Article>\
             </MedlineCitation></PubmedArticle></PubmedArticleSet>",
        )
        .create_async()
        .await;
    let failing = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "2".into()))
        .with_status(502)
        .expect(2)
        .create_async()
        .await;

    let policy = RequestPolicy { fetch_batch_size: 1, ..RequestPolicy::immediate() };
    let client = client_for(&server, policy);
    let ids = vec!["1".to_string(), "2".to_string()];
    let abstracts = client.fetch_abstracts(&ids).await;

    assert_eq!(abstracts.resolve("1"), "Fine.");
    assert_eq!(abstracts.resolve("2"), ABSTRACT_UNAVAILABLE);
    ok.assert_async().await;
    failing.assert_async().await;
}

#[tokio::test]
async fn test_server_error_then_success_recovers() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let recovered = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"esearchresult": {"count": "2", "idlist": ["7", "8"]}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, RequestPolicy::immediate());
    let hits = client.search("asthma", &window(), 10).await.unwrap();

    assert_eq!(hits.total, 2);
    assert_eq!(hits.ids, vec!["7".to_string(), "8".to_string()]);
    unavailable.assert_async().await;
    recovered.assert_async().await;
}

#[tokio::test]
async fn test_failed_summary_batch_only_drops_its_articles() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "1".into()))
        .with_status(200)
        .with_body(
            json!({"result": {
                "uids": ["1"],
                "1": {"uid": "1", "title": "One", "fulljournalname": "Cell", "pubdate": "2023"}
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let failing = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "2".into()))
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let policy = RequestPolicy { summary_batch_size: 1, ..RequestPolicy::immediate() };
    let client = client_for(&server, policy);
    let ids = vec!["1".to_string(), "2".to_string()];
    let summaries = client.fetch_summaries(&ids).await;

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].0, "1");
    assert_eq!(summaries[0].1.title.as_deref(), Some("One"));
    ok.assert_async().await;
    failing.assert_async().await;
}
