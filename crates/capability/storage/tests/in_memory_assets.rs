use bms_storage::{
    BuildingRecord, BuildingStore, DeviceRecord, DeviceStore, InMemoryBuildingStore,
    InMemoryDeviceStore, InMemoryLocationStore, InMemoryRoleStore, LocationRecord, LocationStore,
    RoleStore, UserBuildingRoleRecord,
};
use domain::BuildingRole;

fn device(device_id: &str) -> DeviceRecord {
    DeviceRecord {
        device_id: device_id.to_string(),
        name: format!("Device {device_id}"),
        device_type: "Light".to_string(),
        wattage_w: 10,
        location_id: None,
        assigned_to: Vec::new(),
    }
}

#[tokio::test]
async fn device_created_unclaimed_then_claimed() {
    let store = InMemoryDeviceStore::new();
    store.create_device(device("dev-1")).await.expect("create");

    let found = store.find_device("dev-1").await.expect("find").expect("dev");
    assert!(!found.is_claimed());

    let claimed = store
        .set_location("dev-1", Some("loc-1"))
        .await
        .expect("claim")
        .expect("dev");
    assert_eq!(claimed.location_id.as_deref(), Some("loc-1"));

    let unclaimed = store
        .set_location("dev-1", None)
        .await
        .expect("unclaim")
        .expect("dev");
    assert!(unclaimed.location_id.is_none());
}

#[tokio::test]
async fn duplicate_device_rejected() {
    let store = InMemoryDeviceStore::new();
    store.create_device(device("dev-1")).await.expect("create");
    assert!(store.create_device(device("dev-1")).await.is_err());
}

#[tokio::test]
async fn building_and_location_lookup() {
    let buildings = InMemoryBuildingStore::new();
    let locations = InMemoryLocationStore::new();
    buildings
        .create_building(BuildingRecord {
            building_id: "bld-1".to_string(),
            name: "Main Hall".to_string(),
        })
        .await
        .expect("building");
    locations
        .create_location(LocationRecord {
            location_id: "loc-1".to_string(),
            building_id: "bld-1".to_string(),
            name: "Room 101".to_string(),
        })
        .await
        .expect("location");

    let listed = locations.list_locations("bld-1").await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].location_id, "loc-1");
    assert!(locations.list_locations("bld-2").await.expect("list").is_empty());
    assert!(buildings.find_building("bld-9").await.expect("find").is_none());
}

#[tokio::test]
async fn role_put_is_upsert_per_pair() {
    let store = InMemoryRoleStore::new();
    store
        .put_role(UserBuildingRoleRecord {
            user_id: "user-1".to_string(),
            building_id: "bld-1".to_string(),
            role: BuildingRole::Children,
            assigned_locations: vec!["loc-1".to_string()],
        })
        .await
        .expect("put");
    store
        .put_role(UserBuildingRoleRecord {
            user_id: "user-1".to_string(),
            building_id: "bld-1".to_string(),
            role: BuildingRole::Parent,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("put again");

    let roles = store.list_roles_for_user("user-1").await.expect("list");
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role, BuildingRole::Parent);

    let missing = store.find_role("user-1", "bld-2").await.expect("find");
    assert!(missing.is_none());
}
