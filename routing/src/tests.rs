// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end scenarios wiring the manager to mock collaborators.

use crate::test_utils::{
    MockPacketSource, MockProvider, PopulatorCall, RecordingIcmpResponder, RecordingPopulator,
    icmp_packet, interface, router, tcp_packet, wait_until,
};
use crate::{RoutingConfigBuilder, RoutingControl, RoutingError, RoutingManager};
use nat::{FlowKey, PortAllocator};
use net::Mac;
use pretty_assertions::assert_eq;
use std::net::Ipv4Addr;
use std::sync::Arc;

const VM_MAC: &str = "aa:bb:cc:dd:ee:ff";
const EXTERNAL_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);

struct Harness {
    manager: RoutingManager,
    populator: Arc<RecordingPopulator>,
    responder: Arc<RecordingIcmpResponder>,
    source: Arc<MockPacketSource>,
}

fn harness(provider: MockProvider) -> Harness {
    let populator = Arc::new(RecordingPopulator::default());
    let responder = Arc::new(RecordingIcmpResponder::default());
    let source = Arc::new(MockPacketSource::default());
    let config = RoutingConfigBuilder::default()
        .provider(Arc::new(provider))
        .populator(populator.clone())
        .packet_source(source.clone())
        .icmp_responder(responder.clone())
        .build()
        .unwrap();
    Harness {
        manager: RoutingManager::new(config),
        populator,
        responder,
        source,
    }
}

// Provider with router r1 (PNAT on, external IP 203.0.113.5), network n1 with
// segment 42, and the VM port p1 for 10.0.0.5.
fn pnat_provider() -> MockProvider {
    let mut provider = MockProvider::default();
    provider.add_router(router("r1", "t1", Some(EXTERNAL_IP), true));
    provider.add_network("n1", "t1", "42");
    provider.add_port("p1", "t1", "n1", VM_MAC, &["10.0.0.5"]);
    provider
}

#[test]
fn attached_interface_gets_external_rules() {
    let h = harness(pnat_provider());
    let iface = interface("if-1", "r1", "t1", "p1");

    h.manager.update_router_interface(&iface).unwrap();

    assert_eq!(
        h.populator.calls(),
        vec![PopulatorCall::External {
            vni: 42,
            router: "r1".into(),
            interface: "if-1".into(),
        }]
    );
}

#[test]
fn router_update_covers_known_interfaces() {
    let mut provider = pnat_provider();
    provider.add_network("n2", "t1", "43");
    provider.add_port("p2", "t1", "n2", "02:00:00:00:00:02", &[]);
    let h = harness(provider);

    // Seed the registry without going through the checker.
    h.manager.registry().attach(interface("if-1", "r1", "t1", "p1"));
    h.manager.registry().attach(interface("if-2", "r1", "t1", "p2"));
    h.manager.registry().attach(interface("if-3", "r9", "t1", "p9"));

    let r = router("r1", "t1", Some(EXTERNAL_IP), true);
    h.manager.update_router(&r).unwrap();

    let mut vnis: Vec<u32> = h
        .populator
        .calls()
        .into_iter()
        .map(|call| match call {
            PopulatorCall::External { vni, router, .. } => {
                assert_eq!(router, "r1".into());
                vni
            }
            other => panic!("unexpected populator call {other:?}"),
        })
        .collect();
    vnis.sort_unstable();
    assert_eq!(vnis, vec![42, 43]);
}

#[test]
fn pnat_disabled_router_is_left_alone() {
    let mut provider = MockProvider::default();
    provider.add_router(router("r1", "t1", Some(EXTERNAL_IP), false));
    provider.add_network("n1", "t1", "42");
    provider.add_port("p1", "t1", "n1", VM_MAC, &[]);
    let h = harness(provider);

    h.manager
        .update_router_interface(&interface("if-1", "r1", "t1", "p1"))
        .unwrap();

    assert!(h.populator.calls().is_empty());
}

#[test]
fn missing_tenant_router_fails_but_keeps_the_attachment() {
    let h = harness(MockProvider::default());
    let iface = interface("if-1", "r1", "t1", "p1");

    let err = h.manager.update_router_interface(&iface).unwrap_err();
    assert_eq!(err, RoutingError::NoRouterForTenant("t1".into()));

    // The attachment survives; a later router create/update picks it up.
    let attached = h.manager.registry().interfaces_of(&"r1".into());
    assert_eq!(attached.len(), 1);
    assert_eq!(attached[0].id, "if-1".into());
}

#[test]
fn interface_removal_tears_down_rules() {
    let h = harness(pnat_provider());
    let iface = interface("if-1", "r1", "t1", "p1");

    h.manager.update_router_interface(&iface).unwrap();
    h.manager.remove_router_interface(&iface).unwrap();
    h.manager.remove_router_interface(&iface).unwrap(); // idempotent

    assert_eq!(
        h.populator.calls(),
        vec![
            PopulatorCall::External {
                vni: 42,
                router: "r1".into(),
                interface: "if-1".into(),
            },
            PopulatorCall::RemoveExternal {
                interface: "if-1".into(),
            },
        ]
    );
}

#[test]
fn floating_ip_surface_is_inert() {
    let h = harness(pnat_provider());
    let fip = openstack::FloatingIp {
        id: "fip-1".into(),
        tenant_id: "t1".into(),
        address: EXTERNAL_IP,
        port_id: None,
    };

    h.manager.create_floating_ip(&fip);
    h.manager.update_floating_ip(&fip);
    h.manager.delete_floating_ip(&fip.id);
    h.manager.delete_router(&"r1".into());

    assert!(h.populator.calls().is_empty());
}

#[test]
fn icmp_packet_rides_the_icmp_lane_only() {
    let mut h = harness(pnat_provider());
    h.manager.start().unwrap();

    let ctx = icmp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "203.0.113.1");
    h.source.inject(&ctx);

    assert!(wait_until(|| h.responder.seen().len() == 1));
    assert!(ctx.is_handled());
    // The allocator was never touched and no rules were installed.
    assert_eq!(h.manager.allocator().in_use(), 0);
    assert!(h.populator.calls().is_empty());

    h.manager.stop().unwrap();
}

#[test]
fn outbound_flow_gets_pnat_rules_and_fresh_ports() {
    let mut h = harness(pnat_provider());
    h.manager.start().unwrap();

    h.source
        .inject(&tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| h.populator.calls().len() == 1));

    h.source
        .inject(&tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| h.populator.calls().len() == 2));

    let calls = h.populator.calls();
    let ports: Vec<u16> = calls
        .iter()
        .map(|call| match call {
            PopulatorCall::Pnat { pnat_port, vm_port } => {
                assert_eq!(*vm_port, "p1".into());
                *pnat_port
            }
            other => panic!("unexpected populator call {other:?}"),
        })
        .collect();

    // Both flows from the same (mac, ip) pair hold distinct live bindings.
    assert_eq!(ports.len(), 2);
    assert_ne!(ports[0], ports[1]);
    let expected = FlowKey::new(
        Mac::try_from(VM_MAC).unwrap(),
        "10.0.0.5".parse().unwrap(),
    );
    for port in ports {
        assert!((1024..65535).contains(&port));
        let bound = h
            .manager
            .allocator()
            .binding(port.try_into().unwrap())
            .unwrap();
        assert_eq!(bound, expected);
    }

    h.manager.stop().unwrap();
}

#[test]
fn failed_rule_installation_does_not_kill_the_lane() {
    let mut h = harness(pnat_provider());
    h.manager.start().unwrap();
    let stats = h.manager.pnat_stats().unwrap();

    h.populator.set_failing(true);
    h.source
        .inject(&tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| stats.failed() == 1));

    h.populator.set_failing(false);
    h.source
        .inject(&tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| stats.processed() == 1));
    assert_eq!(h.populator.calls().len(), 1);

    h.manager.stop().unwrap();
}

#[test]
fn failed_icmp_responder_does_not_kill_the_lane() {
    let mut h = harness(pnat_provider());
    h.manager.start().unwrap();
    let stats = h.manager.icmp_stats().unwrap();

    h.responder.set_failing(true);
    h.source
        .inject(&icmp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| stats.failed() == 1));

    h.responder.set_failing(false);
    h.source
        .inject(&icmp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(wait_until(|| stats.processed() == 1));
    assert_eq!(h.responder.seen().len(), 1);

    h.manager.stop().unwrap();
}

#[test]
fn lifecycle_registers_and_unregisters_the_processor() {
    let mut h = harness(pnat_provider());
    assert!(!h.manager.is_running());
    assert_eq!(h.source.processor_count(), 0);

    h.manager.start().unwrap();
    assert!(h.manager.is_running());
    assert_eq!(h.source.processor_count(), 1);
    assert!(h.manager.start().is_err()); // already started

    h.manager.stop().unwrap();
    assert!(!h.manager.is_running());
    assert_eq!(h.source.processor_count(), 0);
    assert!(h.manager.stop().is_err()); // already stopped

    // Stopped engine sees no packets.
    h.source
        .inject(&icmp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
    assert!(h.responder.seen().is_empty());
}

#[test]
fn classification_failure_is_absorbed_on_the_packet_path() {
    // Provider knows no VM port at all: classification errors, the packet
    // path logs and drops, nothing reaches the lanes.
    let mut provider = MockProvider::default();
    provider.add_router(router("r1", "t1", Some(EXTERNAL_IP), true));
    let mut h = harness(provider);
    h.manager.start().unwrap();

    let ctx = tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8");
    h.source.inject(&ctx);

    assert!(!ctx.is_handled());
    assert_eq!(h.manager.allocator().in_use(), 0);
    assert_eq!(h.manager.pnat_stats().unwrap().submitted(), 0);

    h.manager.stop().unwrap();
}

#[test]
fn allocator_stays_consistent_across_lanes_and_control_calls() {
    // Packets and control-plane calls interleave; the shared tables must not
    // lose consistency.
    let mut h = harness(pnat_provider());
    h.manager.start().unwrap();

    for i in 0..16 {
        h.source
            .inject(&tcp_packet("of:0000000000000001", VM_MAC, "10.0.0.5", "8.8.8.8"));
        let iface = interface(&format!("if-{i}"), "r1", "t1", "p1");
        h.manager.update_router_interface(&iface).unwrap();
    }

    assert!(wait_until(|| {
        h.manager.pnat_stats().map(|s| s.processed()) == Some(16)
    }));
    assert_eq!(h.manager.allocator().in_use(), 16);
    // One interface per port id, however many attaches raced.
    assert_eq!(h.manager.registry().len(), 1);

    h.manager.stop().unwrap();
}

#[test]
fn dropping_a_running_manager_stops_it() {
    let source = {
        let mut h = harness(pnat_provider());
        h.manager.start().unwrap();
        Arc::clone(&h.source)
    };
    // The manager went out of scope while running; its processor is gone.
    assert_eq!(source.processor_count(), 0);
}

// Scenario-sized sanity check for the allocator used exactly as the packet
// path uses it.
#[test]
fn allocator_handles_interleaved_release() {
    let allocator = PortAllocator::new();
    let key = FlowKey::new(Mac::try_from(VM_MAC).unwrap(), "10.0.0.5".parse().unwrap());
    let a = allocator.allocate(key).unwrap();
    let b = allocator.allocate(key).unwrap();
    allocator.release(a).unwrap();
    let c = allocator.allocate(key).unwrap();
    assert_eq!(c, a); // lowest free port again
    assert_ne!(b, c);
}
