use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() {
    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8000".to_string());

    let client = Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    println!("Health: {}", health.text().await.unwrap());

    let departments = client
        .get(format!("{base}/catalog/departments"))
        .send()
        .await
        .unwrap();
    println!("Departments: {}", departments.text().await.unwrap());

    let leaders = client
        .get(format!("{base}/catalog/leaders"))
        .send()
        .await
        .unwrap();
    println!("Leaders: {}", leaders.text().await.unwrap());

    let resolve = client
        .get(format!("{base}/public/link/resolve?leader=1&coord=1"))
        .send()
        .await
        .unwrap();
    println!("Link resolve: {}", resolve.text().await.unwrap());

    let payload = json!({
        "document": "1020304050",
        "first_name": "Juan",
        "last_name": "Pérez",
        "address": "Calle 123 # 45 - 67",
        "phone": "+57 3001234567",
        "municipality_id": 1,
        "neighborhood_id": 1,
        "leader_id": 1,
        "coordinator_id": 1,
        "consent": true,
        "captcha_token": "test-token"
    });

    // second attempt must come back as "updated", not a duplicate
    for attempt in 1..=2 {
        let response = client
            .post(format!("{base}/public/voters/register?mode=public"))
            .json(&payload)
            .send()
            .await
            .unwrap();

        println!("Register attempt {attempt}: {}", response.status());
        println!("{}", response.text().await.unwrap());
    }
}
