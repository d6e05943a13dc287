//! End-to-end tests of the dispatcher, reconciler and lifecycle handlers

#[cfg(test)]
mod tests {
    use crate::dispatcher::dispatch;
    use crate::lifecycle::{on_config_changed, on_pebble_ready};
    use crate::reconciler::reconcile;
    use crate::relation::{MockRelationStore, RelationError, RelationStore};
    use crate::settings::{CharmSettings, RelationBackend};
    use crate::state::CharmState;
    use crate::workload::{MockWorkload, ServiceStatus};
    use crate::{CharmContext, CharmError};
    use async_trait::async_trait;
    use mockall::mock;
    use onos_client::{ApiResponse, Method, MockOnosApiClient, OnosApiClient};
    use onos_event_bus::EventListener;
    use onos_shared_types::{
        ActionError, ActionInvocation, ActionName, CharmConfig, CharmEvent, ConfigChange,
        UnitStatus,
    };
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const ROOT: &str = "/root/onos";
    const KARAF: &str = "apache-karaf-4.2.14";

    mock! {
        pub Relations {}

        #[async_trait]
        impl RelationStore for Relations {
            async fn publish_app_data(
                &self,
                endpoint: &str,
                fields: &[(String, String)],
            ) -> Result<usize, RelationError>;
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Arc<Mutex<Vec<CharmEvent>>>,
    }

    #[async_trait]
    impl EventListener for RecordingListener {
        async fn on_event(&self, event: &CharmEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Harness {
        ctx: CharmContext,
        api: Arc<MockOnosApiClient>,
        workload: Arc<MockWorkload>,
        events: Arc<Mutex<Vec<CharmEvent>>>,
        _dir: TempDir,
    }

    impl Harness {
        fn events(&self) -> Vec<CharmEvent> {
            self.events.lock().unwrap().clone()
        }

        fn users_properties(&self) -> Option<String> {
            let path = Path::new(ROOT).join(KARAF).join("etc/users.properties");
            self.workload.snapshot().files.get(&path).cloned()
        }
    }

    fn config() -> CharmConfig {
        CharmConfig {
            admin_password: Some("secret".to_string()),
            ..CharmConfig::default()
        }
    }

    fn settings(dir: &Path) -> CharmSettings {
        CharmSettings {
            state_file: dir.join("state.json"),
            relation_backend: RelationBackend::File,
            relation_file: dir.join("relations.json"),
            report_to_host: false,
            ..CharmSettings::default()
        }
    }

    fn onos_responses() -> MockOnosApiClient {
        let mut api = MockOnosApiClient::new();
        api.add_response(
            Method::GET,
            "/onos/v1/applications",
            ApiResponse::ok(r#"{"applications":[]}"#),
        );
        api.add_response(
            Method::GET,
            "/onos/v1/security/roles",
            ApiResponse::ok(r#"{"roles":["admin","viewer"]}"#),
        );
        for method in [Method::POST, Method::DELETE] {
            api.add_response(
                method,
                "/onos/v1/applications/org.onosproject.acl/active",
                ApiResponse::ok(r#"{ "name" : "org.onosproject.acl",  "state":"ACTIVE" }"#),
            );
        }
        api.add_response(Method::POST, "/onos/v1/security/users", ApiResponse::new(201, ""));
        api.add_response(Method::DELETE, "/onos/v1/security/users/bob", ApiResponse::new(204, ""));
        api.add_response(Method::POST, "/onos/v1/security/groups", ApiResponse::new(201, ""));
        api.add_response(Method::DELETE, "/onos/v1/security/groups/ops", ApiResponse::new(204, ""));
        api
    }

    async fn harness_with(
        config: CharmConfig,
        ready: bool,
        api: MockOnosApiClient,
        relations: Arc<dyn RelationStore>,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(api);
        let workload = Arc::new(MockWorkload::with_onos_install(Path::new(ROOT), KARAF));
        let state = CharmState {
            ready,
            ..CharmState::default()
        };

        let ctx = CharmContext::new(
            settings(dir.path()),
            config,
            state,
            api.clone() as Arc<dyn OnosApiClient>,
            workload.clone(),
            relations,
        );

        let listener = RecordingListener::default();
        let events = listener.events.clone();
        ctx.event_bus
            .register_listener("recorder", listener)
            .await
            .unwrap();

        Harness {
            ctx,
            api,
            workload,
            events,
            _dir: dir,
        }
    }

    async fn harness(config: CharmConfig, ready: bool) -> Harness {
        harness_with(
            config,
            ready,
            onos_responses(),
            Arc::new(MockRelationStore::new()),
        )
        .await
    }

    fn invocation(name: &str, args: &[&str]) -> ActionInvocation {
        ActionInvocation::from_args(name, args.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn test_each_rest_action_sends_exactly_one_request() {
        let h = harness(config(), true).await;

        let table: Vec<(&str, Vec<&str>, Method, &str)> = vec![
            ("list-activated-apps", vec![], Method::GET, "/onos/v1/applications"),
            ("list-available-apps", vec![], Method::GET, "/onos/v1/applications"),
            ("list-roles", vec![], Method::GET, "/onos/v1/security/roles"),
            (
                "activate-app",
                vec!["name=org.onosproject.acl"],
                Method::POST,
                "/onos/v1/applications/org.onosproject.acl/active",
            ),
            (
                "deactivate-app",
                vec!["name=org.onosproject.acl"],
                Method::DELETE,
                "/onos/v1/applications/org.onosproject.acl/active",
            ),
            (
                "add-user",
                vec!["username=bob", "password=x", "group=admin"],
                Method::POST,
                "/onos/v1/security/users",
            ),
            ("delete-user", vec!["username=bob"], Method::DELETE, "/onos/v1/security/users/bob"),
            (
                "add-group",
                vec!["groupname=ops", "roles=group,viewer"],
                Method::POST,
                "/onos/v1/security/groups",
            ),
            (
                "delete-group",
                vec!["groupname=ops"],
                Method::DELETE,
                "/onos/v1/security/groups/ops",
            ),
        ];

        for (i, (name, args, method, path)) in table.into_iter().enumerate() {
            dispatch(&h.ctx, &invocation(name, &args))
                .await
                .unwrap_or_else(|e| panic!("{} failed: {}", name, e));

            let calls = h.api.calls();
            assert_eq!(calls.len(), i + 1, "{} sent more than one request", name);
            assert_eq!(calls[i].method, method, "{}", name);
            assert_eq!(calls[i].path, path, "{}", name);
        }

        assert_eq!(h.api.calls()[0].query_params, vec![("active".to_string(), "true".to_string())]);
        assert!(h.api.calls()[1].query_params.is_empty());
    }

    #[tokio::test]
    async fn test_activate_app_returns_upstream_body_unchanged() {
        let h = harness(config(), true).await;

        let outcome = dispatch(&h.ctx, &invocation("activate-app", &["name=org.onosproject.acl"]))
            .await
            .unwrap();

        assert_eq!(
            outcome.body.as_deref(),
            Some(r#"{ "name" : "org.onosproject.acl",  "state":"ACTIVE" }"#)
        );
        assert_eq!(h.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_add_user_sends_the_three_fields() {
        let h = harness(config(), true).await;

        dispatch(
            &h.ctx,
            &invocation("add-user", &["username=bob", "password=x", "group=admin"]),
        )
        .await
        .unwrap();

        let calls = h.api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body,
            Some(json!({"username": "bob", "password": "x", "group": "admin"}))
        );
    }

    #[tokio::test]
    async fn test_add_user_without_group_is_rejected_locally() {
        let h = harness(config(), true).await;

        let err = dispatch(&h.ctx, &invocation("add-user", &["username=bob", "password=x"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CharmError::Action(ActionError::MissingParameter { ref parameter, .. }) if parameter == "group"
        ));
        assert!(h.api.calls().is_empty());
        assert!(h.events().contains(&CharmEvent::ActionCompleted {
            action: ActionName::AddUser,
            success: false,
        }));
    }

    #[tokio::test]
    async fn test_unknown_action_sends_nothing() {
        let h = harness(config(), true).await;

        let err = dispatch(&h.ctx, &invocation("reboot-cluster", &[]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CharmError::Action(ActionError::UnknownAction { ref name }) if name == "reboot-cluster"
        ));
        assert!(h.api.calls().is_empty());
        assert!(h.events().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_parameter_sends_nothing() {
        let h = harness(config(), true).await;

        let err = dispatch(&h.ctx, &invocation("list-roles", &["verbose=true"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CharmError::Action(ActionError::UnknownParameter { .. })
        ));
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_names_and_bad_roles_send_nothing() {
        let h = harness(config(), true).await;

        let err = dispatch(&h.ctx, &invocation("delete-user", &["username=admin"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CharmError::Action(ActionError::ReservedName { .. })));

        let err = dispatch(
            &h.ctx,
            &invocation("add-group", &["groupname=ops", "roles=group,superuser"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CharmError::Action(ActionError::InvalidParameter { .. })
        ));

        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_failure() {
        let mut api = MockOnosApiClient::new();
        api.add_response(
            Method::POST,
            "/onos/v1/applications/org.onosproject.missing/active",
            ApiResponse::new(404, r#"{"code":404,"message":"App not found"}"#),
        );
        let h = harness_with(config(), true, api, Arc::new(MockRelationStore::new())).await;

        let err = dispatch(&h.ctx, &invocation("activate-app", &["name=org.onosproject.missing"]))
            .await
            .unwrap_err();

        match err {
            CharmError::RemoteOperationFailed { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, r#"{"code":404,"message":"App not found"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // no retries
        assert_eq!(h.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rest_action_without_admin_password_sends_nothing() {
        let h = harness(CharmConfig::default(), true).await;

        let err = dispatch(&h.ctx, &invocation("list-roles", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, CharmError::ConfigurationInvalid(_)));
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_service_actions_signal_the_workload() {
        let mut h = harness(config(), true).await;
        on_pebble_ready(&mut h.ctx).await.unwrap();
        assert_eq!(h.workload.snapshot().status, ServiceStatus::Active);

        let err = dispatch(&h.ctx, &invocation("start", &[])).await.unwrap_err();
        assert_eq!(err.to_string(), "onos service is already active");

        dispatch(&h.ctx, &invocation("stop", &[])).await.unwrap();
        assert_eq!(h.workload.snapshot().status, ServiceStatus::Inactive);

        let err = dispatch(&h.ctx, &invocation("stop", &[])).await.unwrap_err();
        assert_eq!(err.to_string(), "onos service is not running");

        let outcome = dispatch(&h.ctx, &invocation("restart", &[])).await.unwrap();
        assert_eq!(outcome.action, ActionName::Restart);
        assert!(outcome.body.is_none());
        assert_eq!(h.workload.snapshot().status, ServiceStatus::Active);

        // service actions never talk to the REST API
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_config_twice_applies_nothing_the_second_time() {
        let mut h = harness(config(), true).await;

        let first = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(first.restarted);
        assert_eq!(
            first.changes,
            vec![ConfigChange::ManagedFiles, ConfigChange::Environment]
        );
        let after_first = h.workload.snapshot();

        let second = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(second.is_noop());

        let after_second = h.workload.snapshot();
        assert_eq!(after_second.starts, after_first.starts);
        assert_eq!(after_second.pushes, after_first.pushes);
        assert_eq!(after_second.layers.len(), after_first.layers.len());
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_enable_guest_twice_only_applies_once() {
        let mut h = harness(config(), true).await;
        reconcile(&mut h.ctx, false).await.unwrap();
        let starts = h.workload.snapshot().starts;

        h.ctx.config.enable_guest = true;
        h.ctx.config.guest_password = Some("visitor".to_string());

        let first = reconcile(&mut h.ctx, false).await.unwrap();
        assert_eq!(first.changes, vec![ConfigChange::ManagedFiles]);
        assert!(!first.restarted);
        assert!(h
            .users_properties()
            .unwrap()
            .contains("guest = visitor,_g_:guestgroup"));

        let second = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(h.workload.snapshot().starts, starts);
    }

    #[tokio::test]
    async fn test_gui_toggle_changes_environment_and_restarts() {
        let mut h = harness(config(), true).await;
        reconcile(&mut h.ctx, false).await.unwrap();

        h.ctx.config.enable_gui = true;
        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert_eq!(outcome.changes, vec![ConfigChange::Environment]);
        assert!(outcome.restarted);

        let state = h.workload.snapshot();
        let (label, layer) = state.layers.last().unwrap();
        assert_eq!(label, "onos");
        assert_eq!(
            layer.services["onos"].environment["ONOS_APPS"],
            "org.onosproject.drivers,org.onosproject.gui2"
        );
        assert_eq!(state.stops, 1);
        assert!(h.events().contains(&CharmEvent::WorkloadRestarted {
            service: "onos".to_string()
        }));
    }

    #[tokio::test]
    async fn test_config_before_pebble_ready_is_deferred() {
        let mut h = harness(config(), false).await;

        let outcome = on_config_changed(&mut h.ctx).await.unwrap();
        assert!(outcome.deferred_workload);
        assert_eq!(
            h.ctx.state.status,
            UnitStatus::Waiting("Waiting for Pebble in workload container".to_string())
        );
        assert_eq!(h.workload.snapshot().starts, 0);
        assert!(h.ctx.state.applied_workload.is_none());

        let outcome = on_pebble_ready(&mut h.ctx).await.unwrap();
        assert!(outcome.restarted);
        assert!(h.ctx.state.ready);
        assert!(h.ctx.state.started);
        assert_eq!(h.ctx.state.status, UnitStatus::Active);
        assert!(h.users_properties().unwrap().starts_with("admin = secret,_g_:admingroup\n"));
    }

    #[tokio::test]
    async fn test_pebble_ready_reapplies_even_when_unchanged() {
        let mut h = harness(config(), true).await;
        reconcile(&mut h.ctx, false).await.unwrap();
        let pushes = h.workload.snapshot().pushes;

        let outcome = on_pebble_ready(&mut h.ctx).await.unwrap();
        assert!(outcome.restarted);
        assert!(h.workload.snapshot().pushes > pushes);
        assert_eq!(h.workload.snapshot().starts, 2);
    }

    #[tokio::test]
    async fn test_missing_admin_password_blocks() {
        let relations = Arc::new(MockRelationStore::new());
        let mut h = harness_with(
            CharmConfig::default(),
            true,
            onos_responses(),
            relations.clone(),
        )
        .await;

        let err = on_config_changed(&mut h.ctx).await.unwrap_err();
        assert!(matches!(err, CharmError::ConfigurationInvalid(_)));
        assert_eq!(
            h.ctx.state.status,
            UnitStatus::Blocked("Config missing: admin-password".to_string())
        );
        assert!(h.events().contains(&CharmEvent::StatusChanged {
            status: UnitStatus::Blocked("Config missing: admin-password".to_string()),
        }));
        assert!(h.workload.snapshot().layers.is_empty());
        assert!(relations.published().is_empty());
    }

    #[tokio::test]
    async fn test_guest_without_password_blocks() {
        let mut config = config();
        config.enable_guest = true;
        let mut h = harness(config, true).await;

        on_config_changed(&mut h.ctx).await.unwrap_err();
        assert_eq!(
            h.ctx.state.status,
            UnitStatus::Blocked("Config missing: guest-password".to_string())
        );
    }

    #[tokio::test]
    async fn test_external_hostname_is_published_then_cleared() {
        let mut relations = MockRelations::new();
        relations
            .expect_publish_app_data()
            .withf(|endpoint, fields| {
                endpoint.to_string() == "ingress"
                    && fields.contains(&(
                        "service-hostname".to_string(),
                        "onos.example.com".to_string(),
                    ))
                    && fields.contains(&("service-name".to_string(), "onos".to_string()))
                    && fields.contains(&("service-port".to_string(), "8181".to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(1));
        relations
            .expect_publish_app_data()
            .withf(|endpoint, fields| {
                endpoint.to_string() == "ingress"
                    && fields.len() == 3
                    && fields.iter().all(|(_, value)| value.is_empty())
            })
            .times(1)
            .returning(|_, _| Ok(1));

        let mut config = config();
        config.external_hostname = Some("onos.example.com".to_string());
        let mut h = harness_with(config, true, onos_responses(), Arc::new(relations)).await;

        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(outcome.changes.contains(&ConfigChange::Ingress));

        // unchanged hostname is not published again
        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(outcome.is_noop());

        h.ctx.config.external_hostname = None;
        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert_eq!(outcome.changes, vec![ConfigChange::Ingress]);
        assert!(!outcome.restarted);
        assert!(h.ctx.state.applied_ingress.is_none());
        assert!(h
            .events()
            .contains(&CharmEvent::IngressUpdated { hostname: None }));
    }

    /// Relation store that writes nothing until `relate` is called
    #[derive(Default)]
    struct LateRelation {
        related: AtomicBool,
        writes: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl LateRelation {
        fn relate(&self) {
            self.related.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RelationStore for LateRelation {
        async fn publish_app_data(
            &self,
            _endpoint: &str,
            fields: &[(String, String)],
        ) -> Result<usize, RelationError> {
            if !self.related.load(Ordering::SeqCst) {
                return Ok(0);
            }
            self.writes.lock().unwrap().push(fields.to_vec());
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_hostname_reaches_relation_created_later() {
        let relations = Arc::new(LateRelation::default());
        let mut config = config();
        config.external_hostname = Some("onos.example.com".to_string());
        let mut h = harness_with(config, true, onos_responses(), relations.clone()).await;

        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert!(!outcome.changes.contains(&ConfigChange::Ingress));
        assert!(h.ctx.state.applied_ingress.is_none());
        assert!(!h
            .events()
            .iter()
            .any(|event| matches!(event, CharmEvent::IngressUpdated { .. })));

        relations.relate();
        let outcome = reconcile(&mut h.ctx, false).await.unwrap();
        assert_eq!(outcome.changes, vec![ConfigChange::Ingress]);
        assert!(!outcome.restarted);

        let writes = relations.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].contains(&(
            "service-hostname".to_string(),
            "onos.example.com".to_string()
        )));
        assert_eq!(
            h.ctx.state.applied_ingress.as_ref().map(|data| data.service_hostname.as_str()),
            Some("onos.example.com")
        );

        // published once, not again
        assert!(reconcile(&mut h.ctx, false).await.unwrap().is_noop());
        assert_eq!(relations.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_state_survives_between_processes() {
        let mut h = harness(config(), true).await;
        on_config_changed(&mut h.ctx).await.unwrap();
        h.ctx.persist().await.unwrap();

        let state_file: PathBuf = h.ctx.settings.state_file.clone();
        let loaded = CharmState::load(&state_file).await.unwrap();
        assert_eq!(loaded.applied_workload, h.ctx.state.applied_workload);
        assert_eq!(loaded.status, UnitStatus::Active);
        assert!(loaded.updated_at.is_some());

        // a fresh process with the persisted state does nothing
        let workload = Arc::new(MockWorkload::with_onos_install(Path::new(ROOT), KARAF));
        let mut ctx = CharmContext::new(
            h.ctx.settings.clone(),
            config(),
            loaded,
            Arc::new(MockOnosApiClient::new()),
            workload.clone(),
            Arc::new(MockRelationStore::new()),
        );
        let outcome = reconcile(&mut ctx, false).await.unwrap();
        assert!(outcome.is_noop());
        assert_eq!(workload.snapshot().starts, 0);
    }
}
