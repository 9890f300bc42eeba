use std::net::IpAddr;

use ccw_db::models::tnc_acceptance::CreateTncAcceptance;
use ccw_db::repositories::TncAcceptanceRepo;
use sqlx::PgPool;

fn acceptance(config_id: &str, ip: &str) -> CreateTncAcceptance {
    CreateTncAcceptance {
        config_id: config_id.to_string(),
        ip_address: ip.parse::<IpAddr>().unwrap(),
        user_agent: Some("integration-test".to_string()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn records_ipv4_and_ipv6_without_netmask(pool: PgPool) {
    let v4 = TncAcceptanceRepo::create(&pool, &acceptance("cfg-1", "203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(v4.ip_address, "203.0.113.7");
    assert_eq!(v4.user_agent.as_deref(), Some("integration-test"));

    let v6 = TncAcceptanceRepo::create(&pool, &acceptance("cfg-1", "2001:db8::5"))
        .await
        .unwrap();
    assert_eq!(v6.ip_address, "2001:db8::5");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_config_id_newest_first(pool: PgPool) {
    TncAcceptanceRepo::create(&pool, &acceptance("cfg-a", "10.0.0.1")).await.unwrap();
    TncAcceptanceRepo::create(&pool, &acceptance("cfg-b", "10.0.0.2")).await.unwrap();
    TncAcceptanceRepo::create(&pool, &acceptance("cfg-a", "10.0.0.3")).await.unwrap();

    let rows = TncAcceptanceRepo::list(&pool, Some("cfg-a"), None, None).await.unwrap();
    let ips: Vec<_> = rows.iter().map(|r| r.ip_address.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.3", "10.0.0.1"]);

    let all = TncAcceptanceRepo::list(&pool, None, None, None).await.unwrap();
    assert_eq!(all.len(), 3);
}
