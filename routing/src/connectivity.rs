// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! External-connectivity checks for routers.

use crate::RoutingError;
use crate::populator::RulePopulator;
use net::Vni;
use openstack::{OpenstackData, OpenstackRouter, RouterInterface};
use std::sync::Arc;
use tracing::debug;

/// Decides whether a router warrants external-connectivity rules and, if so,
/// installs them for its interfaces.
pub struct ExternalConnectivityChecker {
    provider: Arc<dyn OpenstackData>,
    populator: Arc<dyn RulePopulator>,
}

impl ExternalConnectivityChecker {
    /// Build a checker over the given provider and populator.
    #[must_use]
    pub fn new(
        provider: Arc<dyn OpenstackData>,
        populator: Arc<dyn RulePopulator>,
    ) -> ExternalConnectivityChecker {
        ExternalConnectivityChecker {
            provider,
            populator,
        }
    }

    /// Run the check for `router` against the given attached interfaces.
    ///
    /// A router without an external fixed IP, or with PNAT disabled, needs no
    /// external rules: the check logs at diagnostic level and succeeds
    /// without touching the populator. Otherwise every interface's network is
    /// resolved to its VNI and handed to
    /// [`RulePopulator::populate_external_rules`].
    ///
    /// When a router is attached to several external networks, which
    /// external IP gates the check is unspecified.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable ports/networks/segment ids and propagates
    /// populator failures unchanged. Interfaces are processed in order up to
    /// the first failure.
    pub fn check(
        &self,
        router: &OpenstackRouter,
        interfaces: &[RouterInterface],
    ) -> Result<(), RoutingError> {
        let Some(external_ip) = router.gateway.any_external_ip() else {
            debug!("router {}: no external fixed IP, skipping pnat setup", router.id);
            return Ok(());
        };
        if !router.gateway.enable_pnat {
            debug!("router {}: pnat disabled, skipping pnat setup", router.id);
            return Ok(());
        }

        for interface in interfaces {
            let vni = self.interface_vni(interface)?;
            debug!(
                "router {}: populating external rules for interface {} (vni {vni}, external ip {external_ip})",
                router.id, interface.id
            );
            self.populator
                .populate_external_rules(vni, router, interface)?;
        }
        Ok(())
    }

    // VNI of the network behind the interface's attachment port.
    fn interface_vni(&self, interface: &RouterInterface) -> Result<Vni, RoutingError> {
        let port = self
            .provider
            .port(&interface.port_id)
            .ok_or_else(|| RoutingError::UnknownPort(interface.port_id.clone()))?;
        let network = self
            .provider
            .network(&port.network_id)
            .ok_or_else(|| RoutingError::UnknownNetwork(port.network_id.clone()))?;
        network
            .segment_id
            .parse::<u32>()
            .ok()
            .and_then(|raw| Vni::new_checked(raw).ok())
            .ok_or_else(|| RoutingError::BadSegmentId {
                network: network.id.clone(),
                segment: network.segment_id.clone(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{MockProvider, PopulatorCall, RecordingPopulator, interface, router};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    fn checker(provider: MockProvider) -> (ExternalConnectivityChecker, Arc<RecordingPopulator>) {
        let populator = Arc::new(RecordingPopulator::default());
        let checker = ExternalConnectivityChecker::new(Arc::new(provider), populator.clone());
        (checker, populator)
    }

    #[test]
    #[traced_test]
    fn pnat_disabled_is_a_logged_noop() {
        let mut provider = MockProvider::default();
        let r = router("r1", "t1", Some(Ipv4Addr::new(203, 0, 113, 5)), false);
        provider.add_network("n1", "t1", "42");
        provider.add_port("p1", "t1", "n1", "02:00:00:00:00:01", &[]);

        let (checker, populator) = checker(provider);
        checker
            .check(&r, &[interface("if-1", "r1", "t1", "p1")])
            .unwrap();

        assert!(populator.calls().is_empty());
        assert!(logs_contain("pnat disabled, skipping pnat setup"));
    }

    #[test]
    #[traced_test]
    fn missing_external_ip_is_a_logged_noop() {
        let provider = MockProvider::default();
        let r = router("r1", "t1", None, true);

        let (checker, populator) = checker(provider);
        checker
            .check(&r, &[interface("if-1", "r1", "t1", "p1")])
            .unwrap();

        assert!(populator.calls().is_empty());
        assert!(logs_contain("no external fixed IP, skipping pnat setup"));
    }

    #[test]
    fn populates_one_rule_set_per_interface() {
        let mut provider = MockProvider::default();
        let r = router("r1", "t1", Some(Ipv4Addr::new(203, 0, 113, 5)), true);
        provider.add_network("n1", "t1", "42");
        provider.add_network("n2", "t1", "43");
        provider.add_port("p1", "t1", "n1", "02:00:00:00:00:01", &[]);
        provider.add_port("p2", "t1", "n2", "02:00:00:00:00:02", &[]);

        let (checker, populator) = checker(provider);
        checker
            .check(
                &r,
                &[
                    interface("if-1", "r1", "t1", "p1"),
                    interface("if-2", "r1", "t1", "p2"),
                ],
            )
            .unwrap();

        assert_eq!(
            populator.calls(),
            vec![
                PopulatorCall::External {
                    vni: 42,
                    router: r.id.clone(),
                    interface: "if-1".into(),
                },
                PopulatorCall::External {
                    vni: 43,
                    router: r.id.clone(),
                    interface: "if-2".into(),
                },
            ]
        );
    }

    #[test]
    fn unresolvable_port_fails_the_check() {
        let provider = MockProvider::default();
        let r = router("r1", "t1", Some(Ipv4Addr::new(203, 0, 113, 5)), true);

        let (checker, populator) = checker(provider);
        let err = checker
            .check(&r, &[interface("if-1", "r1", "t1", "p1")])
            .unwrap_err();

        assert_eq!(err, RoutingError::UnknownPort("p1".into()));
        assert!(populator.calls().is_empty());
    }

    #[test]
    fn garbage_segment_id_fails_the_check() {
        let mut provider = MockProvider::default();
        let r = router("r1", "t1", Some(Ipv4Addr::new(203, 0, 113, 5)), true);
        provider.add_network("n1", "t1", "physnet-3");
        provider.add_port("p1", "t1", "n1", "02:00:00:00:00:01", &[]);

        let (checker, _) = checker(provider);
        let err = checker
            .check(&r, &[interface("if-1", "r1", "t1", "p1")])
            .unwrap_err();

        assert_eq!(
            err,
            RoutingError::BadSegmentId {
                network: "n1".into(),
                segment: "physnet-3".to_string(),
            }
        );
    }
}
