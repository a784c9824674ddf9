// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mock collaborators and packet builders for the test suite.

use crate::classify::IcmpEvent;
use crate::handlers::IcmpResponder;
use crate::populator::{PopulatorError, RulePopulator};
use crate::source::{PacketProcessor, PacketSource};
use crate::RoutingError;
use nat::PnatPort;
use net::Mac;
use net::Vni;
use net::eth::{EtherType, EthFrame};
use net::ip::{IpProtocol, Ipv4Meta};
use net::packet::{DeviceId, PacketContext};
use openstack::{
    ExternalGateway, InterfaceId, NetworkId, OpenstackData, OpenstackNetwork, OpenstackPort,
    OpenstackRouter, RouterId, RouterInterface,
};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

///////////////////////////////////////////////////////////////////////////////
// Model builders
///////////////////////////////////////////////////////////////////////////////

pub(crate) fn interface(id: &str, router: &str, tenant: &str, port: &str) -> RouterInterface {
    RouterInterface {
        id: id.into(),
        router_id: router.into(),
        tenant_id: tenant.into(),
        port_id: port.into(),
    }
}

pub(crate) fn router(
    id: &str,
    tenant: &str,
    external_ip: Option<Ipv4Addr>,
    enable_pnat: bool,
) -> OpenstackRouter {
    let mut gateway = ExternalGateway {
        external_fixed_ips: Default::default(),
        enable_pnat,
    };
    if let Some(ip) = external_ip {
        gateway.external_fixed_ips.insert("ext-net".into(), ip);
    }
    OpenstackRouter {
        id: id.into(),
        tenant_id: tenant.into(),
        name: format!("router-{id}"),
        gateway,
    }
}

///////////////////////////////////////////////////////////////////////////////
// Packet builders
///////////////////////////////////////////////////////////////////////////////

fn ipv4_packet(device: &str, src_mac: &str, proto: IpProtocol, src: &str, dst: &str) -> Arc<PacketContext> {
    let frame = EthFrame::ipv4(
        Mac::try_from(src_mac).unwrap(),
        Mac([0x02, 0, 0, 0, 0, 0xfe]),
        Ipv4Meta {
            protocol: proto,
            source: src.parse().unwrap(),
            destination: dst.parse().unwrap(),
        },
    );
    Arc::new(PacketContext::new(DeviceId::new(device), frame))
}

pub(crate) fn icmp_packet(device: &str, src_mac: &str, src: &str, dst: &str) -> Arc<PacketContext> {
    ipv4_packet(device, src_mac, IpProtocol::Icmp, src, dst)
}

pub(crate) fn tcp_packet(device: &str, src_mac: &str, src: &str, dst: &str) -> Arc<PacketContext> {
    ipv4_packet(device, src_mac, IpProtocol::Tcp, src, dst)
}

pub(crate) fn arp_packet(device: &str, src_mac: &str) -> Arc<PacketContext> {
    let frame = EthFrame::unparsed(
        Mac::try_from(src_mac).unwrap(),
        Mac::BROADCAST,
        EtherType::ARP,
    );
    Arc::new(PacketContext::new(DeviceId::new(device), frame))
}

///////////////////////////////////////////////////////////////////////////////
// Networking data provider
///////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub(crate) struct MockProvider {
    ports: Vec<OpenstackPort>,
    networks: HashMap<NetworkId, OpenstackNetwork>,
    routers: Vec<OpenstackRouter>,
}

impl MockProvider {
    pub(crate) fn add_port(
        &mut self,
        id: &str,
        tenant: &str,
        network: &str,
        mac: &str,
        fixed_ips: &[&str],
    ) {
        self.ports.push(OpenstackPort {
            id: id.into(),
            tenant_id: tenant.into(),
            network_id: network.into(),
            mac: Mac::try_from(mac).unwrap(),
            fixed_ips: fixed_ips
                .iter()
                .enumerate()
                .map(|(i, ip)| (format!("subnet-{i}").as_str().into(), ip.parse().unwrap()))
                .collect(),
        });
    }

    pub(crate) fn add_network(&mut self, id: &str, tenant: &str, segment: &str) {
        self.networks.insert(
            id.into(),
            OpenstackNetwork {
                id: id.into(),
                tenant_id: tenant.into(),
                segment_id: segment.to_string(),
            },
        );
    }

    pub(crate) fn add_router(&mut self, router: OpenstackRouter) {
        self.routers.push(router);
    }
}

impl OpenstackData for MockProvider {
    fn port(&self, id: &openstack::PortId) -> Option<OpenstackPort> {
        self.ports.iter().find(|p| &p.id == id).cloned()
    }

    fn port_by_mac(&self, mac: Mac) -> Option<OpenstackPort> {
        self.ports.iter().find(|p| p.mac == mac).cloned()
    }

    fn network(&self, id: &NetworkId) -> Option<OpenstackNetwork> {
        self.networks.get(id).cloned()
    }

    fn routers(&self) -> Vec<OpenstackRouter> {
        self.routers.clone()
    }
}

///////////////////////////////////////////////////////////////////////////////
// Rule populator
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PopulatorCall {
    External {
        vni: u32,
        router: RouterId,
        interface: InterfaceId,
    },
    RemoveExternal {
        interface: InterfaceId,
    },
    Pnat {
        pnat_port: u16,
        vm_port: openstack::PortId,
    },
}

#[derive(Default)]
pub(crate) struct RecordingPopulator {
    calls: Mutex<Vec<PopulatorCall>>,
    failing: AtomicBool,
}

impl RecordingPopulator {
    pub(crate) fn calls(&self) -> Vec<PopulatorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every subsequent operation fail until reset.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: PopulatorCall) -> Result<(), PopulatorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PopulatorError::new("device rejected the flow objective"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl RulePopulator for RecordingPopulator {
    fn populate_external_rules(
        &self,
        vni: Vni,
        router: &OpenstackRouter,
        interface: &RouterInterface,
    ) -> Result<(), PopulatorError> {
        self.record(PopulatorCall::External {
            vni: vni.as_u32(),
            router: router.id.clone(),
            interface: interface.id.clone(),
        })
    }

    fn remove_external_rules(&self, interface: &RouterInterface) -> Result<(), PopulatorError> {
        self.record(PopulatorCall::RemoveExternal {
            interface: interface.id.clone(),
        })
    }

    fn populate_pnat_rules(
        &self,
        _ctx: &PacketContext,
        pnat_port: PnatPort,
        vm_port: &OpenstackPort,
    ) -> Result<(), PopulatorError> {
        self.record(PopulatorCall::Pnat {
            pnat_port: pnat_port.as_u16(),
            vm_port: vm_port.id.clone(),
        })
    }
}

///////////////////////////////////////////////////////////////////////////////
// ICMP responder
///////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub(crate) struct RecordingIcmpResponder {
    seen: Mutex<Vec<DeviceId>>,
    failing: AtomicBool,
}

impl RecordingIcmpResponder {
    pub(crate) fn seen(&self) -> Vec<DeviceId> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl IcmpResponder for RecordingIcmpResponder {
    fn respond(&self, event: &IcmpEvent) -> Result<(), RoutingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RoutingError::Internal("icmp responder is down"));
        }
        self.seen.lock().unwrap().push(event.ctx.device().clone());
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////
// Packet source
///////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub(crate) struct MockPacketSource {
    processors: Mutex<Vec<Arc<dyn PacketProcessor>>>,
}

impl MockPacketSource {
    /// Deliver one packet to every registered processor, in order.
    pub(crate) fn inject(&self, ctx: &Arc<PacketContext>) {
        let processors = self.processors.lock().unwrap().clone();
        for processor in processors {
            processor.process(ctx);
        }
    }

    pub(crate) fn processor_count(&self) -> usize {
        self.processors.lock().unwrap().len()
    }
}

impl PacketSource for MockPacketSource {
    fn add_processor(&self, processor: Arc<dyn PacketProcessor>) {
        self.processors.lock().unwrap().push(processor);
    }

    fn remove_processor(&self, processor: &Arc<dyn PacketProcessor>) {
        self.processors
            .lock()
            .unwrap()
            .retain(|p| !Arc::ptr_eq(p, processor));
    }
}

///////////////////////////////////////////////////////////////////////////////
// Misc
///////////////////////////////////////////////////////////////////////////////

/// Poll `condition` until it holds or two seconds pass.
pub(crate) fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
