use bms_access::RoleResolver;
use bms_storage::{
    BuildingRecord, BuildingStore, DeviceRecord, InMemoryBuildingStore, InMemoryLocationStore,
    InMemoryRoleStore, InMemoryUserStore, LocationRecord, LocationStore, RoleStore,
    UserBuildingRoleRecord, UserRecord, UserStore,
};
use domain::{BuildingRole, UserContext};
use std::sync::Arc;

struct Fixture {
    resolver: RoleResolver,
    roles: Arc<InMemoryRoleStore>,
}

async fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserStore::new());
    let roles = Arc::new(InMemoryRoleStore::new());
    let locations = Arc::new(InMemoryLocationStore::new());
    let buildings = Arc::new(InMemoryBuildingStore::new());

    users
        .create_user(UserRecord {
            user_id: "user-admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "x".to_string(),
            display_name: "Admin".to_string(),
            is_system_administrator: true,
            refresh_jti: None,
        })
        .await
        .expect("admin");
    users
        .create_user(UserRecord {
            user_id: "user-child".to_string(),
            email: "child@example.com".to_string(),
            password_hash: "x".to_string(),
            display_name: "Child".to_string(),
            is_system_administrator: false,
            refresh_jti: None,
        })
        .await
        .expect("child");

    buildings
        .create_building(BuildingRecord {
            building_id: "bldg-1".to_string(),
            name: "Main".to_string(),
        })
        .await
        .expect("building");
    locations
        .create_location(LocationRecord {
            location_id: "loc-1".to_string(),
            building_id: "bldg-1".to_string(),
            name: "Lab".to_string(),
        })
        .await
        .expect("loc-1");
    locations
        .create_location(LocationRecord {
            location_id: "loc-2".to_string(),
            building_id: "bldg-1".to_string(),
            name: "Office".to_string(),
        })
        .await
        .expect("loc-2");

    Fixture {
        resolver: RoleResolver::new(users, roles.clone(), locations, buildings),
        roles,
    }
}

fn device(id: &str, location: Option<&str>) -> DeviceRecord {
    DeviceRecord {
        device_id: id.to_string(),
        name: id.to_string(),
        device_type: "AC".to_string(),
        wattage_w: 1500,
        location_id: location.map(|value| value.to_string()),
        assigned_to: Vec::new(),
    }
}

fn admin() -> UserContext {
    UserContext::new("user-admin", "admin@example.com", true)
}

fn child() -> UserContext {
    UserContext::new("user-child", "child@example.com", false)
}

#[tokio::test]
async fn parent_sees_every_claimed_device_in_building() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Parent,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("role");

    let user = child();
    assert!(fx.resolver.can_view(&user, &device("d1", Some("loc-1"))).await.expect("view"));
    assert!(fx.resolver.can_view(&user, &device("d2", Some("loc-2"))).await.expect("view"));
}

#[tokio::test]
async fn children_role_limited_to_assigned_locations() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Children,
            assigned_locations: vec!["loc-1".to_string()],
        })
        .await
        .expect("role");

    let user = child();
    assert!(fx.resolver.can_view(&user, &device("d1", Some("loc-1"))).await.expect("view"));
    assert!(!fx.resolver.can_view(&user, &device("d2", Some("loc-2"))).await.expect("view"));
}

#[tokio::test]
async fn legacy_assignment_grants_visibility() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Children,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("role");

    let mut dev = device("d2", Some("loc-2"));
    dev.assigned_to.push("user-child".to_string());
    assert!(fx.resolver.can_view(&child(), &dev).await.expect("view"));
}

#[tokio::test]
async fn unclaimed_devices_are_admin_only() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Parent,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("role");

    let dev = device("d-unclaimed", None);
    assert!(fx.resolver.can_view(&admin(), &dev).await.expect("view"));
    assert!(!fx.resolver.can_view(&child(), &dev).await.expect("view"));
}

#[tokio::test]
async fn broken_location_reference_denies_access() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Parent,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("role");

    // 位置引用不存在：拒绝访问而不是默认放行
    let dev = device("d-orphan", Some("loc-missing"));
    assert!(!fx.resolver.can_view(&child(), &dev).await.expect("view"));
    // 管理员不依赖位置解析
    assert!(fx.resolver.can_view(&admin(), &dev).await.expect("view"));
}

#[tokio::test]
async fn no_role_means_no_access() {
    let fx = fixture().await;
    let role = fx
        .resolver
        .role_in_building("user-child", "bldg-1")
        .await
        .expect("role");
    assert_eq!(role.role, BuildingRole::None);
    assert!(!fx.resolver.can_view(&child(), &device("d1", Some("loc-1"))).await.expect("view"));
}

#[tokio::test]
async fn can_manage_requires_admin_or_parent() {
    let fx = fixture().await;
    assert!(fx.resolver.can_manage(&admin()).await.expect("manage"));
    assert!(!fx.resolver.can_manage(&child()).await.expect("manage"));

    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Parent,
            assigned_locations: Vec::new(),
        })
        .await
        .expect("role");
    assert!(fx.resolver.can_manage(&child()).await.expect("manage"));
}

#[tokio::test]
async fn resolve_visible_devices_filters_per_device() {
    let fx = fixture().await;
    fx.roles
        .put_role(UserBuildingRoleRecord {
            user_id: "user-child".to_string(),
            building_id: "bldg-1".to_string(),
            role: BuildingRole::Children,
            assigned_locations: vec!["loc-1".to_string()],
        })
        .await
        .expect("role");

    let devices = vec![
        device("d1", Some("loc-1")),
        device("d2", Some("loc-2")),
        device("d3", None),
        device("d4", Some("loc-missing")),
    ];

    let visible = fx.resolver.resolve_visible_devices(&child(), devices.clone()).await;
    let ids: Vec<&str> = visible.iter().map(|item| item.device_id.as_str()).collect();
    assert_eq!(ids, vec!["d1"]);

    let all = fx.resolver.resolve_visible_devices(&admin(), devices).await;
    assert_eq!(all.len(), 4);
}
