//! Flujos completos contra Postgres. Cada test recibe una base de datos nueva
//! con las migraciones aplicadas (`DATABASE_URL` apunta al servidor).

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use hospital_ops::controllers::ambulance_request_controller::AmbulanceRequestController;
use hospital_ops::controllers::fleet_controller::FleetController;
use hospital_ops::dto::ambulance_dto::{
    AmbulanceListQuery, AssignRequest, CreateAmbulanceRequest, ForwardRequest,
    HospitalResponseRequest,
};
use hospital_ops::dto::fleet_dto::{CreateAmbulanceUnitRequest, UpdateAmbulanceUnitRequest};
use hospital_ops::models::{
    Actor, Ambulance, AmbulanceStatus, AmbulanceType, HospitalResponse, Priority, RequestStatus,
    User, UserRole,
};
use hospital_ops::repositories::ambulance_repository::AmbulanceRepository;
use hospital_ops::repositories::user_repository::UserRepository;
use hospital_ops::services::RequestAction;
use hospital_ops::utils::errors::AppError;

async fn seed_user(pool: &PgPool, role: UserRole, name: &str) -> Actor {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", Uuid::new_v4()),
        phone: None,
        role,
        password_hash: "not-a-real-hash".to_string(),
        created_at: Utc::now(),
    };
    let saved = UserRepository::new(pool.clone()).create(&user).await.unwrap();
    Actor::new(saved.id, saved.role, saved.name)
}

fn new_request(patient: &str, emergency: &str, priority: Priority) -> CreateAmbulanceRequest {
    CreateAmbulanceRequest {
        patient_name: patient.to_string(),
        patient_phone: "+34 600 111 222".to_string(),
        pickup_address: "Calle Mayor 1, Madrid".to_string(),
        destination_address: None,
        emergency_type: emergency.to_string(),
        condition_description: None,
        priority: Some(priority),
    }
}

async fn create_request(pool: &PgPool, customer: &Actor, patient: &str) -> Uuid {
    AmbulanceRequestController::new(pool.clone())
        .create(customer, new_request(patient, "cardiac", Priority::High))
        .await
        .unwrap()
        .request
        .id
}

async fn add_ambulance(pool: &PgPool, hospital: &Actor, registration: &str) -> Ambulance {
    FleetController::new(pool.clone())
        .create(
            hospital,
            CreateAmbulanceUnitRequest {
                registration_number: registration.to_string(),
                ambulance_type: AmbulanceType::Advanced,
                driver_name: "Luis Ortega".to_string(),
                driver_phone: None,
            },
        )
        .await
        .unwrap()
}

/// Reenviar la solicitud al hospital y aceptarla con la ambulancia indicada
async fn forward_and_accept(
    pool: &PgPool,
    dispatcher: &Actor,
    hospital: &Actor,
    request_id: Uuid,
    ambulance_id: Uuid,
) {
    let controller = AmbulanceRequestController::new(pool.clone());
    controller
        .forward(dispatcher, request_id, ForwardRequest { hospital_id: hospital.user_id })
        .await
        .unwrap();
    controller
        .hospital_response(
            hospital,
            request_id,
            HospitalResponseRequest {
                response: HospitalResponse::Accepted,
                ambulance_id: Some(ambulance_id),
                notes: None,
            },
        )
        .await
        .unwrap();
}

async fn reload_ambulance(pool: &PgPool, id: Uuid) -> Ambulance {
    AmbulanceRepository::new(pool.clone())
        .find_by_id(id)
        .await
        .unwrap()
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_claims_have_one_winner(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let first = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let second = seed_user(&pool, UserRole::Staff, "Marta").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;

    let controller = AmbulanceRequestController::new(pool.clone());
    let (a, b) = tokio::join!(
        controller.assign(&first, request_id, AssignRequest::default()),
        controller.assign(&second, request_id, AssignRequest::default()),
    );

    let (winner, loser) = match (a, b) {
        (Ok(won), Err(lost)) => ((won, &first), lost),
        (Err(lost), Ok(won)) => ((won, &second), lost),
        other => panic!("expected exactly one winner, got {:?}", other),
    };
    assert!(matches!(loser, AppError::Conflict(_)));

    let (claimed, staff) = winner;
    assert_eq!(claimed.request.status, RequestStatus::Assigned);
    assert_eq!(claimed.request.assigned_staff_id, Some(staff.user_id));
    assert!(claimed.request.assigned_at.is_some());

    // Un tercer intento ve la solicitud ya asignada
    let late = seed_user(&pool, UserRole::Staff, "Rosa").await;
    let err = controller
        .assign(&late, request_id, AssignRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_assigns_named_staff_but_not_itself(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let admin = seed_user(&pool, UserRole::Admin, "Root").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let controller = AmbulanceRequestController::new(pool.clone());

    let err = controller
        .assign(&admin, request_id, AssignRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = controller
        .assign(&admin, request_id, AssignRequest { staff_id: Some(customer.user_id) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let claimed = controller
        .assign(&admin, request_id, AssignRequest { staff_id: Some(staff.user_id) })
        .await
        .unwrap();
    assert_eq!(claimed.request.assigned_staff_id, Some(staff.user_id));
    assert!(!claimed.actions.contains(&RequestAction::AssignToMe));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_accept_binds_request_and_ambulance(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let ambulance = add_ambulance(&pool, &hospital, "m-1234-ab").await;
    assert_eq!(ambulance.registration_number, "M-1234-AB");

    forward_and_accept(&pool, &staff, &hospital, request_id, ambulance.id).await;

    let request = AmbulanceRequestController::new(pool.clone())
        .get(&hospital, request_id)
        .await
        .unwrap()
        .request;
    assert_eq!(request.hospital_response, Some(HospitalResponse::Accepted));
    assert_eq!(request.assigned_ambulance_id, Some(ambulance.id));
    assert_eq!(request.status, RequestStatus::Pending);

    let bound = reload_ambulance(&pool, ambulance.id).await;
    assert_eq!(bound.status, AmbulanceStatus::Assigned);
    assert_eq!(bound.current_request_id, Some(request_id));

    // Una ambulancia ocupada no puede aceptar otra solicitud
    let other_id = create_request(&pool, &customer, "Lucía Gómez").await;
    let controller = AmbulanceRequestController::new(pool.clone());
    controller
        .forward(&staff, other_id, ForwardRequest { hospital_id: hospital.user_id })
        .await
        .unwrap();
    let err = controller
        .hospital_response(
            &hospital,
            other_id,
            HospitalResponseRequest {
                response: HospitalResponse::Accepted,
                ambulance_id: Some(ambulance.id),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let untouched = controller.get(&hospital, other_id).await.unwrap().request;
    assert_eq!(untouched.hospital_response, Some(HospitalResponse::Pending));
    assert_eq!(untouched.assigned_ambulance_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_park_clears_both_links(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let ambulance = add_ambulance(&pool, &hospital, "M-1234-AB").await;
    forward_and_accept(&pool, &staff, &hospital, request_id, ambulance.id).await;

    let fleet = FleetController::new(pool.clone());
    let parked = fleet.park(&hospital, ambulance.id).await.unwrap();
    assert_eq!(parked.status, AmbulanceStatus::Available);
    assert_eq!(parked.current_request_id, None);

    let request = AmbulanceRequestController::new(pool.clone())
        .get(&hospital, request_id)
        .await
        .unwrap()
        .request;
    assert_eq!(request.assigned_ambulance_id, None);

    // Ya no está asignada: aparcar otra vez es un error
    assert!(fleet.park(&hospital, ambulance.id).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_completing_request_releases_ambulance(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let ambulance = add_ambulance(&pool, &hospital, "M-1234-AB").await;
    let controller = AmbulanceRequestController::new(pool.clone());

    controller
        .assign(&staff, request_id, AssignRequest::default())
        .await
        .unwrap();
    forward_and_accept(&pool, &staff, &hospital, request_id, ambulance.id).await;

    controller
        .update_status(&staff, request_id, RequestStatus::OnTheWay)
        .await
        .unwrap();
    let completed = controller
        .update_status(&staff, request_id, RequestStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.request.status, RequestStatus::Completed);
    assert!(completed.request.completed_at.is_some());
    assert!(completed.actions.is_empty());
    assert_eq!(completed.request.assigned_ambulance_id, Some(ambulance.id));

    let released = reload_ambulance(&pool, ambulance.id).await;
    assert_eq!(released.status, AmbulanceStatus::Available);
    assert_eq!(released.current_request_id, None);

    let err = controller
        .update_status(&staff, request_id, RequestStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelling_request_releases_ambulance(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let ambulance = add_ambulance(&pool, &hospital, "M-1234-AB").await;
    forward_and_accept(&pool, &staff, &hospital, request_id, ambulance.id).await;

    let cancelled = AmbulanceRequestController::new(pool.clone())
        .update_status(&customer, request_id, RequestStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.request.status, RequestStatus::Cancelled);

    let released = reload_ambulance(&pool, ambulance.id).await;
    assert_eq!(released.status, AmbulanceStatus::Available);
    assert_eq!(released.current_request_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_forwarded_requests_list_unread_first(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let other_hospital = seed_user(&pool, UserRole::Hospital, "Hospital Ramón y Cajal").await;
    let controller = AmbulanceRequestController::new(pool.clone());

    let older = create_request(&pool, &customer, "Juan Pérez").await;
    let newer = create_request(&pool, &customer, "Lucía Gómez").await;
    let elsewhere = create_request(&pool, &customer, "Carlos Ruiz").await;
    for id in [older, newer] {
        controller
            .forward(&staff, id, ForwardRequest { hospital_id: hospital.user_id })
            .await
            .unwrap();
    }
    controller
        .forward(&staff, elsewhere, ForwardRequest { hospital_id: other_hospital.user_id })
        .await
        .unwrap();

    let listed: Vec<Uuid> = controller
        .forwarded_requests(&hospital)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.request.id)
        .collect();
    assert_eq!(listed, vec![newer, older]);

    // Leer la más reciente la manda detrás de la no leída
    let read = controller.mark_read(&hospital, newer).await.unwrap();
    assert!(read.request.hospital_read);
    assert!(!read.actions.contains(&RequestAction::MarkRead));

    let listed: Vec<Uuid> = controller
        .forwarded_requests(&hospital)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.request.id)
        .collect();
    assert_eq!(listed, vec![older, newer]);

    let err = controller.mark_read(&hospital, elsewhere).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_intersect(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let other_customer = seed_user(&pool, UserRole::Customer, "Bea").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let controller = AmbulanceRequestController::new(pool.clone());

    let cardiac_high = controller
        .create(&customer, new_request("Juan Pérez", "Cardiac arrest", Priority::High))
        .await
        .unwrap()
        .request
        .id;
    let cardiac_low = controller
        .create(&customer, new_request("Lucía Gómez", "cardiac check", Priority::Low))
        .await
        .unwrap()
        .request
        .id;
    let fracture_high = controller
        .create(&other_customer, new_request("Carlos Ruiz", "fracture", Priority::High))
        .await
        .unwrap()
        .request
        .id;
    controller
        .assign(&staff, cardiac_low, AssignRequest::default())
        .await
        .unwrap();

    let ids = |responses: Vec<hospital_ops::dto::ambulance_dto::AmbulanceRequestResponse>| {
        responses.into_iter().map(|r| r.request.id).collect::<Vec<_>>()
    };

    let all = ids(controller.list(&staff, AmbulanceListQuery::default()).await.unwrap());
    assert_eq!(all, vec![fracture_high, cardiac_low, cardiac_high]);

    let search = AmbulanceListQuery {
        search: Some("  CARDIAC ".to_string()),
        ..Default::default()
    };
    assert_eq!(
        ids(controller.list(&staff, search).await.unwrap()),
        vec![cardiac_low, cardiac_high]
    );

    let search_and_priority = AmbulanceListQuery {
        search: Some("cardiac".to_string()),
        priority: Some(Priority::High),
        ..Default::default()
    };
    assert_eq!(
        ids(controller.list(&staff, search_and_priority).await.unwrap()),
        vec![cardiac_high]
    );

    let all_three = AmbulanceListQuery {
        search: Some("cardiac".to_string()),
        status: Some(RequestStatus::Pending),
        priority: Some(Priority::Low),
    };
    assert!(ids(controller.list(&staff, all_three).await.unwrap()).is_empty());

    // Los comodines de LIKE se buscan literalmente
    let wildcard = AmbulanceListQuery {
        search: Some("%".to_string()),
        ..Default::default()
    };
    assert!(ids(controller.list(&staff, wildcard).await.unwrap()).is_empty());

    // Un cliente solo ve sus propias solicitudes
    let high = AmbulanceListQuery {
        priority: Some(Priority::High),
        ..Default::default()
    };
    assert_eq!(
        ids(controller.list(&other_customer, high).await.unwrap()),
        vec![fracture_high]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assigned_ambulance_cannot_change_status_or_be_deleted(pool: PgPool) {
    let customer = seed_user(&pool, UserRole::Customer, "Ana").await;
    let staff = seed_user(&pool, UserRole::Staff, "Pablo").await;
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let request_id = create_request(&pool, &customer, "Juan Pérez").await;
    let ambulance = add_ambulance(&pool, &hospital, "M-1234-AB").await;
    forward_and_accept(&pool, &staff, &hospital, request_id, ambulance.id).await;
    let fleet = FleetController::new(pool.clone());

    let err = fleet
        .update(
            &hospital,
            ambulance.id,
            UpdateAmbulanceUnitRequest {
                status: Some(AmbulanceStatus::Maintenance),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = fleet.delete(&hospital, ambulance.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Otros campos sí se pueden editar mientras está asignada
    let renamed = fleet
        .update(
            &hospital,
            ambulance.id,
            UpdateAmbulanceUnitRequest {
                driver_name: Some("Elena Sanz".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.driver_name, "Elena Sanz");
    assert_eq!(renamed.status, AmbulanceStatus::Assigned);

    // Tras aparcarla se puede borrar
    fleet.park(&hospital, ambulance.id).await.unwrap();
    fleet.delete(&hospital, ambulance.id).await.unwrap();
    assert!(fleet.get(&hospital, ambulance.id).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fleet_is_scoped_to_owner(pool: PgPool) {
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    let other = seed_user(&pool, UserRole::Hospital, "Hospital Ramón y Cajal").await;
    let ambulance = add_ambulance(&pool, &hospital, "M-1234-AB").await;
    let fleet = FleetController::new(pool.clone());

    let err = fleet.delete(&other, ambulance.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = fleet
        .update(&other, ambulance.id, UpdateAmbulanceUnitRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = fleet.delete(&hospital, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // La misma matrícula en otro hospital es válida
    add_ambulance(&pool, &other, "M-1234-AB").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unique_violation_is_conflict(pool: PgPool) {
    let hospital = seed_user(&pool, UserRole::Hospital, "Hospital La Paz").await;
    add_ambulance(&pool, &hospital, "M-1234-AB").await;

    // Inserción directa que se salta la comprobación previa del controlador
    let duplicate = Ambulance::new(
        hospital.user_id,
        "M-1234-AB".to_string(),
        AmbulanceType::Basic,
        "Luis Ortega".to_string(),
        None,
    );
    let err = AmbulanceRepository::new(pool.clone())
        .create(&duplicate)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}
