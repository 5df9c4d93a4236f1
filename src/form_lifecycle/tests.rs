// Tests for the form lifecycle state machine

#[cfg(test)]
mod tests {
    use super::super::context::FormContext;
    use super::super::errors::ServiceError;
    use super::super::mocks::*;
    use super::super::runtime::{FormRuntime, RuntimeOptions};
    use super::super::state_machine::{FormMachine, FormOptions};
    use super::super::traits::MockFormServices;
    use super::super::types::*;
    use crate::dirty_registry::DirtyRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn values(value: serde_json::Value) -> FormData {
        serde_json::from_value(value).unwrap()
    }

    fn connection_schema() -> FormSchema {
        FormSchema::new(vec![
            FieldDescriptor::url("baseUrl").required(),
            FieldDescriptor::text("username").credential(),
            FieldDescriptor::secret("password").credential().sensitive(),
        ])
    }

    fn capability_schema() -> FormSchema {
        FormSchema::new(vec![FieldDescriptor::text("name").required()])
            .with_selector("type")
            .with_variant(
                "webhook",
                vec![
                    FieldDescriptor::url("target").required(),
                    FieldDescriptor::number("retries", Some(0.0), Some(10.0), true)
                        .with_default(json!(3)),
                ],
            )
            .with_variant("email", vec![FieldDescriptor::text("address").required()])
            .with_variant("noop", vec![])
    }

    /// Machine that has completed its initial load with `data`
    fn loaded_machine(schema: FormSchema, data: serde_json::Value) -> FormMachine {
        let mut machine = FormMachine::new(schema, FormOptions::default().with_delete(true));
        let invocation = machine.take_invocation();
        assert_eq!(invocation, Some(Invocation::Load { generation: 1 }));
        machine.handle(MachineEvent::LoadResolved {
            generation: 1,
            result: Ok(ResourceSnapshot::new(values(data))),
        });
        assert_eq!(machine.phase(), FormPhase::Loaded);
        machine
    }

    fn resolve_save(machine: &mut FormMachine, result: Result<SaveOutcome, ServiceError>) {
        let Some(Invocation::Save { generation, .. }) = machine.take_invocation() else {
            panic!("expected a pending save");
        };
        machine.handle(MachineEvent::SaveResolved { generation, result });
    }

    #[test]
    fn test_scenario_a_loaded_form_is_pristine_and_quiet() {
        let machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        let ctx = machine.context();

        assert!(ctx.is_pristine());
        assert!(ctx.validation_errors.is_empty());
        assert!(!machine.can_save());
        assert_eq!(ctx.data.keys().collect::<Vec<_>>(), ctx.pristine_data.keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_scenario_b_update_enables_save() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        machine.send(FormEvent::update("baseUrl", "https://x"));
        let ctx = machine.context();

        assert!(ctx.is_touched("baseUrl"));
        assert!(!ctx.is_pristine());
        assert!(ctx.validation_errors.is_empty());
        assert!(machine.can_save());
    }

    #[test]
    fn test_scenario_c_blocked_save_reveals_errors() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        let step = machine.send(FormEvent::Save);

        assert!(!step.transitioned());
        assert_eq!(machine.phase(), FormPhase::Loaded);
        assert!(machine.take_invocation().is_none());
        let ctx = machine.context();
        assert!(ctx.submit_attempted);
        assert_eq!(ctx.validation_errors["baseUrl"], FIELD_REQUIRED);
        assert!(ctx.should_show_errors());
        assert!(ctx.is_touched("username"));
    }

    #[test]
    fn test_scenario_d_authentication_failure() {
        let mut machine = loaded_machine(
            connection_schema(),
            json!({"baseUrl": "https://x", "username": "admin", "password": ""}),
        );
        machine.send(FormEvent::update("password", "wrong"));
        machine.send(FormEvent::Save);
        assert_eq!(machine.phase(), FormPhase::Saving);

        resolve_save(&mut machine, Err(ServiceError::status(403)));

        assert_eq!(machine.phase(), FormPhase::Loaded);
        let ctx = machine.context();
        assert_eq!(ctx.data["password"], json!(""));
        assert_eq!(ctx.save_errors["password"], " ");
        assert_eq!(ctx.save_errors["username"], " ");
        assert_eq!(ctx.save_error.as_deref(), Some("Authentication failed"));
        assert!(ctx.validation_errors.is_empty());
        assert_eq!(ctx.live_save_errors().len(), 2);
    }

    #[test]
    fn test_scenario_e_type_switch_drops_foreign_errors() {
        let mut machine = loaded_machine(capability_schema(), json!({"name": "hook", "type": "webhook"}));
        machine.send(FormEvent::update("target", "not a url"));
        assert_eq!(machine.context().validation_errors["target"], FIELD_INVALID_URL);

        machine.send(FormEvent::select_type("email"));

        let ctx = machine.context();
        assert!(!ctx.validation_errors.contains_key("target"));
        assert!(ctx.data.contains_key("address"));
        assert!(ctx.pristine_data.contains_key("address"));
        assert!(!ctx.is_pristine());
    }

    #[test]
    fn test_type_switch_seeds_defaults() {
        let mut machine = loaded_machine(capability_schema(), json!({"name": "hook", "type": null}));
        assert!(!machine.can_save());

        machine.send(FormEvent::select_type("webhook"));
        let ctx = machine.context();
        assert_eq!(ctx.data["retries"], json!(3));
        assert_eq!(ctx.pristine_data["retries"], json!(3));
        assert_eq!(ctx.data["type"], json!("webhook"));
    }

    #[test]
    fn test_empty_variant_saves_once_selected() {
        let mut machine = loaded_machine(
            FormSchema::default().with_selector("type").with_variant("noop", vec![]),
            json!({}),
        );
        assert!(!machine.can_save());
        machine.send(FormEvent::select_type("noop"));
        assert!(machine.can_save());
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let mut machine = loaded_machine(capability_schema(), json!({"name": "x", "type": "email"}));
        let step = machine.send(FormEvent::select_type("carrier-pigeon"));
        assert!(step.ignored);
        assert_eq!(machine.context().data["type"], json!("email"));
    }

    #[test]
    fn test_read_only_and_unknown_fields_are_not_editable() {
        let schema = FormSchema::new(vec![
            FieldDescriptor::text("id").read_only(),
            FieldDescriptor::text("name"),
        ]);
        let mut machine = loaded_machine(schema, json!({"id": "abc", "name": "n"}));

        assert!(machine.send(FormEvent::update("id", "zzz")).ignored);
        assert!(machine.send(FormEvent::update("ghost", "boo")).ignored);
        let ctx = machine.context();
        assert_eq!(ctx.data["id"], json!("abc"));
        assert!(!ctx.data.contains_key("ghost"));
        assert!(ctx.is_pristine());
    }

    #[test]
    fn test_touched_gates_errors() {
        let schema = FormSchema::new(vec![
            FieldDescriptor::text("a").required(),
            FieldDescriptor::text("b").required(),
        ]);
        let mut machine = loaded_machine(schema, json!({"a": "", "b": ""}));
        machine.send(FormEvent::update("a", ""));

        let ctx = machine.context();
        assert_eq!(ctx.validation_errors.len(), 1);
        assert!(ctx.validation_errors.contains_key("a"));
        for field in ctx.validation_errors.keys() {
            assert!(ctx.is_touched(field));
        }
        assert!(!ctx.should_show_errors());
    }

    #[test]
    fn test_save_is_not_accepted_while_saving() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        machine.send(FormEvent::update("baseUrl", "https://x"));
        machine.send(FormEvent::Save);
        assert!(machine.take_invocation().is_some());

        let step = machine.send(FormEvent::Save);
        assert!(step.ignored);
        assert_eq!(machine.phase(), FormPhase::Saving);
        assert!(machine.take_invocation().is_none());

        assert!(machine.send(FormEvent::update("baseUrl", "https://y")).ignored);
        assert_eq!(machine.context().data["baseUrl"], json!("https://x"));
    }

    #[test]
    fn test_successful_save_resets_baseline() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        machine.send(FormEvent::update("baseUrl", "https://x"));
        machine.send(FormEvent::Save);
        resolve_save(&mut machine, Ok(SaveOutcome::default()));

        assert_eq!(machine.phase(), FormPhase::Loaded);
        assert!(machine.context().is_pristine());
        assert_eq!(machine.context().pristine_data["baseUrl"], json!("https://x"));
        assert_eq!(
            machine.take_notification(),
            Some(Notification::Saved(machine.context().data.clone()))
        );
    }

    #[test]
    fn test_save_echo_replaces_values() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
        machine.send(FormEvent::update("baseUrl", "https://x"));
        machine.send(FormEvent::Save);
        resolve_save(
            &mut machine,
            Ok(SaveOutcome {
                data: Some(values(json!({"baseUrl": "https://x/"}))),
            }),
        );

        let ctx = machine.context();
        assert_eq!(ctx.data["baseUrl"], json!("https://x/"));
        assert!(ctx.data.contains_key("password"));
        assert!(ctx.is_pristine());
    }

    #[test]
    fn test_stale_save_error_is_superseded() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://old"}));
        machine.send(FormEvent::update("baseUrl", "https://new"));
        machine.send(FormEvent::Save);
        resolve_save(
            &mut machine,
            Err(ServiceError::status(409).with_field_error("baseUrl", "old value no longer matches")),
        );
        assert_eq!(machine.context().field_error("baseUrl"), Some("old value no longer matches"));

        machine.send(FormEvent::update("baseUrl", "https://newer"));

        let ctx = machine.context();
        assert!(!ctx.is_save_error_live("baseUrl"));
        assert!(!ctx.save_errors.contains_key("baseUrl"));
        assert_eq!(ctx.field_error("baseUrl"), None);
    }

    #[test]
    fn test_superseded_save_error_stays_gone() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://a"}));
        machine.send(FormEvent::update("baseUrl", "https://taken"));
        machine.send(FormEvent::Save);
        resolve_save(
            &mut machine,
            Err(ServiceError::status(409).with_field_error("baseUrl", "already registered")),
        );
        assert!(machine.context().is_save_error_live("baseUrl"));

        machine.send(FormEvent::update("baseUrl", "https://other"));
        machine.send(FormEvent::update("baseUrl", "https://taken"));

        let ctx = machine.context();
        assert!(ctx.live_save_errors().is_empty());
        assert_eq!(ctx.field_error("baseUrl"), None);
    }

    #[test]
    fn test_save_error_for_field_outside_form_is_kept() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://x"}));
        machine.send(FormEvent::update("username", "admin"));
        machine.send(FormEvent::Save);
        resolve_save(
            &mut machine,
            Err(ServiceError::status(400).with_field_error("secretKey", "bad key")),
        );

        let ctx = machine.context();
        assert_eq!(ctx.save_error.as_deref(), Some("Operation failed"));
        assert_eq!(ctx.save_errors["secretKey"], "bad key");
        assert_eq!(ctx.field_error("secretKey"), Some("bad key"));
        assert_eq!(ctx.live_save_errors().len(), 1);
    }

    #[test]
    fn test_submission_leaves_out_previous_variant() {
        let mut machine = loaded_machine(
            capability_schema(),
            json!({"name": "hook", "type": "webhook", "target": "https://t", "owner": "ops"}),
        );
        machine.send(FormEvent::select_type("email"));
        machine.send(FormEvent::update("address", "ops@example.com"));
        machine.send(FormEvent::Save);

        let Some(Invocation::Save { form, .. }) = machine.take_invocation() else {
            panic!("expected a pending save");
        };
        assert_eq!(
            form.data.keys().collect::<Vec<_>>(),
            vec!["address", "name", "owner", "type"]
        );
        assert_eq!(machine.context().data["target"], json!("https://t"));
    }

    #[test]
    fn test_selection_limited_to_available_types() {
        let mut machine = FormMachine::new(capability_schema(), FormOptions::default());
        machine.take_invocation();
        machine.handle(MachineEvent::LoadResolved {
            generation: 1,
            result: Ok(ResourceSnapshot {
                values: values(json!({"name": "alerts"})),
                available_types: vec!["email".to_string()],
            }),
        });

        assert!(machine.send(FormEvent::select_type("webhook")).ignored);
        assert_eq!(machine.context().data["type"], json!(null));

        assert!(!machine.send(FormEvent::select_type("email")).ignored);
        assert_eq!(machine.context().data["type"], json!("email"));
    }

    #[test]
    fn test_mismatched_generation_is_still_applied() {
        let mut machine = FormMachine::new(connection_schema(), FormOptions::default());
        machine.take_invocation();
        machine.handle(MachineEvent::LoadResolved {
            generation: 7,
            result: Ok(ResourceSnapshot::new(values(json!({"baseUrl": "https://x"})))),
        });
        assert_eq!(machine.phase(), FormPhase::Loaded);
        assert_eq!(machine.context().data["baseUrl"], json!("https://x"));

        machine.send(FormEvent::update("username", "late"));
        machine.send(FormEvent::Save);
        assert!(machine.take_invocation().is_some());
        machine.handle(MachineEvent::SaveResolved {
            generation: 99,
            result: Ok(SaveOutcome::default()),
        });
        assert_eq!(machine.phase(), FormPhase::Loaded);
        assert!(machine.context().is_pristine());
        assert!(matches!(machine.take_notification(), Some(Notification::Saved(_))));
    }

    #[test]
    fn test_clear_save_error_skips_one_validation_pass() {
        let mut machine = loaded_machine(
            connection_schema(),
            json!({"baseUrl": "https://x", "username": "u", "password": "p"}),
        );
        machine.send(FormEvent::update("baseUrl", ""));
        machine.send(FormEvent::Save);
        assert!(!machine.context().validation_errors.is_empty());

        machine.send(FormEvent::ClearSaveError);
        let ctx = machine.context();
        assert!(ctx.validation_errors.is_empty());
        assert!(ctx.save_error.is_none());

        machine.send(FormEvent::update("baseUrl", ""));
        assert_eq!(machine.context().validation_errors["baseUrl"], FIELD_REQUIRED);
    }

    #[test]
    fn test_load_failure_and_retry() {
        let mut machine = FormMachine::new(connection_schema(), FormOptions::default());
        machine.take_invocation();
        machine.handle(MachineEvent::LoadResolved {
            generation: 1,
            result: Err(ServiceError::transport("timeout")),
        });
        assert_eq!(machine.phase(), FormPhase::LoadError);
        assert_eq!(machine.context().load_error.as_deref(), Some("Connection failed"));
        assert!(machine.send(FormEvent::Save).ignored);

        machine.send(FormEvent::Retry);
        assert_eq!(machine.phase(), FormPhase::Loading);
        assert!(machine.context().load_error.is_none());
        assert_eq!(machine.take_invocation(), Some(Invocation::Load { generation: 2 }));
    }

    #[test]
    fn test_delete_cancel_returns_to_editing() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://x"}));
        machine.send(FormEvent::update("username", "edited"));
        machine.send(FormEvent::ShowDeleteModal);
        assert_eq!(machine.phase(), FormPhase::AwaitingDeleteConfirmation);
        assert!(machine.take_invocation().is_none());

        machine.send(FormEvent::CancelDelete);
        assert_eq!(machine.phase(), FormPhase::Loaded);
        assert_eq!(machine.context().data["username"], json!("edited"));
    }

    #[test]
    fn test_failed_delete_keeps_edits() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://x"}));
        machine.send(FormEvent::update("username", "edited"));
        let before: FormContext = machine.context().clone();

        machine.send(FormEvent::ShowDeleteModal);
        machine.send(FormEvent::ConfirmDelete);
        assert_eq!(machine.phase(), FormPhase::ConfirmDelete);
        let Some(Invocation::Delete { generation }) = machine.take_invocation() else {
            panic!("expected a pending delete");
        };
        machine.handle(MachineEvent::DeleteResolved {
            generation,
            result: Err(ServiceError::message("Resource is in use")),
        });

        assert_eq!(machine.phase(), FormPhase::Loaded);
        let ctx = machine.context();
        assert_eq!(ctx.delete_error.as_deref(), Some("Resource is in use"));
        assert_eq!(ctx.data, before.data);
        assert_eq!(ctx.is_pristine(), before.is_pristine());
    }

    #[test]
    fn test_successful_delete_ends_machine() {
        let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": "https://x"}));
        machine.send(FormEvent::ShowDeleteModal);
        machine.send(FormEvent::ConfirmDelete);
        let generation = machine.take_invocation().unwrap().generation();
        machine.handle(MachineEvent::DeleteResolved {
            generation,
            result: Ok(()),
        });

        assert_eq!(machine.phase(), FormPhase::Ended);
        assert_eq!(machine.take_notification(), Some(Notification::Deleted));
        assert!(machine.send(FormEvent::Retry).ignored);
        let phases: Vec<FormPhase> = machine.history().map(|r| r.to).collect();
        assert_eq!(
            phases,
            vec![
                FormPhase::Loaded,
                FormPhase::AwaitingDeleteConfirmation,
                FormPhase::ConfirmDelete,
                FormPhase::Ended
            ]
        );
    }

    #[test]
    fn test_delete_modal_requires_delete_support() {
        let mut machine = FormMachine::new(connection_schema(), FormOptions::default());
        machine.take_invocation();
        machine.handle(MachineEvent::LoadResolved {
            generation: 1,
            result: Ok(ResourceSnapshot::default()),
        });
        assert!(machine.send(FormEvent::ShowDeleteModal).ignored);
        assert_eq!(machine.phase(), FormPhase::Loaded);
    }

    #[test]
    fn test_delete_guard_blocks_confirmation() {
        struct NeverDelete;
        impl super::super::guards::FormGuards for NeverDelete {
            fn can_save(&self, _: &FormSchema, _: &FormContext, _: &FieldErrors) -> bool {
                true
            }
            fn can_delete(&self, _: &FormContext) -> bool {
                false
            }
        }

        let mut machine = FormMachine::new(
            connection_schema(),
            FormOptions::default().with_delete(true).with_guards(NeverDelete),
        );
        machine.take_invocation();
        machine.handle(MachineEvent::LoadResolved {
            generation: 1,
            result: Ok(ResourceSnapshot::default()),
        });
        machine.send(FormEvent::ShowDeleteModal);
        assert!(machine.send(FormEvent::ConfirmDelete).ignored);
        assert_eq!(machine.phase(), FormPhase::AwaitingDeleteConfirmation);
    }

    #[tokio::test]
    async fn test_runtime_load_edit_save() {
        let services = Arc::new(
            ScriptedServices::new()
                .with_values(json!({"baseUrl": ""}))
                .with_save(Ok(SaveOutcome::default())),
        );
        let machine = FormMachine::new(connection_schema(), FormOptions::default().with_form_id("conn"));
        let mut handle = FormRuntime::spawn(machine, services.clone());

        let loaded = handle.settled().await.unwrap();
        assert_eq!(loaded.phase, FormPhase::Loaded);
        assert!(!loaded.can_save);

        handle.send(FormEvent::update("baseUrl", "https://x")).await.unwrap();
        handle.send(FormEvent::Save).await.unwrap();
        let saved = handle.settled().await.unwrap();

        assert_eq!(saved.phase, FormPhase::Loaded);
        assert!(saved.is_pristine);
        assert_eq!(services.save_count(), 1);
        assert_eq!(services.last_submitted().unwrap()["baseUrl"], json!("https://x"));

        let machine = handle.close().await.unwrap();
        assert_eq!(machine.processed(), 2);
        assert_eq!(services.saved_callbacks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_runtime_never_overlaps_saves() {
        let (services, gate) = ScriptedServices::new()
            .with_values(json!({"baseUrl": "https://x"}))
            .gated();
        let services = Arc::new(services);
        let machine = FormMachine::new(connection_schema(), FormOptions::default());
        let mut handle = FormRuntime::spawn(machine, services.clone());
        handle.settled().await.unwrap();

        handle.send(FormEvent::Save).await.unwrap();
        handle.wait_for(|s| s.phase == FormPhase::Saving).await.unwrap();
        handle.send(FormEvent::Save).await.unwrap();
        handle.send(FormEvent::Save).await.unwrap();
        handle.wait_for(|s| s.processed == 3).await.unwrap();
        assert_eq!(services.save_count(), 1);

        gate.add_permits(1);
        let settled = handle.settled().await.unwrap();
        assert_eq!(settled.phase, FormPhase::Loaded);
        assert_eq!(services.save_count(), 1);
    }

    #[tokio::test]
    async fn test_runtime_tracks_dirty_registry() {
        let registry = DirtyRegistry::new();
        let services = Arc::new(ScriptedServices::new().with_values(json!({"baseUrl": "https://x"})));
        let machine = FormMachine::new(connection_schema(), FormOptions::default().with_form_id("edit-1"));
        let mut handle = FormRuntime::spawn_with(
            machine,
            services,
            RuntimeOptions::default().with_registry(registry.clone()),
        );
        handle.settled().await.unwrap();
        assert!(!registry.has_any_dirty());

        handle.send(FormEvent::update("username", "someone")).await.unwrap();
        handle.settled().await.unwrap();
        assert!(registry.is_dirty("edit-1"));

        handle.send(FormEvent::update("username", "")).await.unwrap();
        handle.settled().await.unwrap();
        assert!(!registry.has_any_dirty());

        handle.send(FormEvent::update("username", "again")).await.unwrap();
        handle.settled().await.unwrap();
        handle.close().await.unwrap();
        assert!(!registry.has_any_dirty());
    }

    #[tokio::test]
    async fn test_runtime_delete_flow_with_mock_services() {
        let mut services = MockFormServices::new();
        services
            .expect_load()
            .times(1)
            .returning(|| Ok(ResourceSnapshot::new(FormData::new())));
        services.expect_delete().times(1).returning(|| Ok(()));
        services.expect_on_delete_success().times(1).return_const(());
        services.expect_save().never();

        let machine = FormMachine::new(connection_schema(), FormOptions::default().with_delete(true));
        let mut handle = FormRuntime::spawn(machine, Arc::new(services));
        handle.settled().await.unwrap();

        handle.send(FormEvent::ShowDeleteModal).await.unwrap();
        handle.send(FormEvent::ConfirmDelete).await.unwrap();
        let ended = handle.settled().await.unwrap();
        assert_eq!(ended.phase, FormPhase::Ended);

        let machine = handle.close().await.unwrap();
        assert_eq!(machine.phase(), FormPhase::Ended);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn edit() -> impl Strategy<Value = (usize, String)> {
            (0usize..3, prop_oneof![Just(String::new()), "[a-z]{1,6}", Just("https://x".to_string())])
        }

        proptest! {
            #[test]
            fn prop_errors_only_on_touched_fields(edits in proptest::collection::vec(edit(), 0..12)) {
                let mut machine = loaded_machine(connection_schema(), json!({"baseUrl": ""}));
                let fields = ["baseUrl", "username", "password"];
                for (index, value) in &edits {
                    machine.send(FormEvent::update(fields[*index], value.as_str()));
                }

                let ctx = machine.context();
                for field in ctx.validation_errors.keys() {
                    prop_assert!(ctx.is_touched(field));
                }
                prop_assert_eq!(ctx.is_pristine(), ctx.data == ctx.pristine_data);
            }

            #[test]
            fn prop_restoring_values_restores_pristine(edits in proptest::collection::vec(edit(), 1..12)) {
                let mut machine = loaded_machine(
                    connection_schema(),
                    json!({"baseUrl": "https://x", "username": "u", "password": "p"}),
                );
                let original = machine.context().pristine_data.clone();
                let fields = ["baseUrl", "username", "password"];
                for (index, value) in &edits {
                    machine.send(FormEvent::update(fields[*index], value.as_str()));
                }
                for field in fields {
                    machine.send(FormEvent::update(field, original[field].clone()));
                }

                prop_assert!(machine.context().is_pristine());
                prop_assert!(machine.can_save());
            }
        }
    }
}
